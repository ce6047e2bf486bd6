use crate::session::SessionState;
use crate::theme::Theme;
use crate::ui::UiAction;
use eframe::egui::load::SizedTexture;
use eframe::egui::{self, Align, Key, Layout};

/// Full-size view of one attachment. Escape or a click on the backdrop closes
/// it; arrow keys cycle when there is more than one image.
pub fn lightbox(
    ctx: &egui::Context,
    session: &SessionState,
    textures: &[egui::TextureHandle],
    theme: &Theme,
    actions: &mut Vec<UiAction>,
) {
    let Some(index) = session.viewer().current() else {
        return;
    };
    let Some(texture) = textures.get(index) else {
        return;
    };
    let count = session.attachments().len();
    let name = session
        .attachments()
        .get(index)
        .map(|attachment| attachment.name.clone())
        .unwrap_or_default();

    if count > 1 {
        let (next, prev) = ctx.input(|input| {
            (
                input.key_pressed(Key::ArrowRight),
                input.key_pressed(Key::ArrowLeft),
            )
        });
        if next {
            actions.push(UiAction::ViewerNext);
        }
        if prev {
            actions.push(UiAction::ViewerPrev);
        }
    }

    let max_size = ctx.screen_rect().size() * 0.8;
    let response = egui::Modal::new(egui::Id::new("image_lightbox"))
        .backdrop_color(theme.backdrop)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong(format!("{name} ({}/{count})", index + 1));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Close").clicked() {
                        actions.push(UiAction::CloseViewer);
                    }
                });
            });
            ui.add(egui::Image::new(SizedTexture::from_handle(texture)).max_size(max_size));
            if count > 1 {
                ui.horizontal(|ui| {
                    if ui.button("< Prev").clicked() {
                        actions.push(UiAction::ViewerPrev);
                    }
                    if ui.button("Next >").clicked() {
                        actions.push(UiAction::ViewerNext);
                    }
                });
            }
        });

    if response.should_close() {
        actions.push(UiAction::CloseViewer);
    }
}
