pub mod lightbox;

use crate::session::{Phase, SessionState};
use crate::theme::Theme;
use eframe::egui::load::SizedTexture;
use eframe::egui::{self, Color32, RichText};
use std::path::PathBuf;

/// Something the user did this frame. Collected while rendering and applied
/// afterwards, so rendering never mutates session state mid-layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Ask,
    Clarify,
    Clear,
    AttachPaths(Vec<PathBuf>),
    ClearAttachments,
    RemoveAttachment(usize),
    OpenViewer(usize),
    ViewerNext,
    ViewerPrev,
    CloseViewer,
    DismissAlert,
}

/// Splits the path field into individual paths. Newlines and `;` separate.
pub fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn badge(ui: &mut egui::Ui, text: &str, (fill, text_color): (Color32, Color32)) {
    ui.label(
        RichText::new(format!(" {text} "))
            .strong()
            .color(text_color)
            .background_color(fill),
    );
}

fn muted(theme: &Theme, text: impl Into<String>) -> RichText {
    RichText::new(text).small().color(theme.text_muted)
}

pub fn composer(
    ui: &mut egui::Ui,
    session: &mut SessionState,
    path_input: &mut String,
    drop_hover: bool,
    theme: &Theme,
    textures: &[egui::TextureHandle],
    actions: &mut Vec<UiAction>,
) {
    theme.card_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.strong("Question");
        ui.add(
            egui::TextEdit::multiline(session.query_mut())
                .hint_text("e.g. Give me three steps to take RAG into production.")
                .desired_rows(5)
                .desired_width(f32::INFINITY),
        );

        attachment_strip(ui, session, theme, textures, actions);

        if drop_hover {
            ui.label(RichText::new("Drop images to attach them").color(theme.accent_primary));
        }

        ui.horizontal(|ui| {
            let width = (ui.available_width() - 220.0).max(160.0);
            ui.add(
                egui::TextEdit::singleline(path_input)
                    .hint_text("Image paths (separate with ;) or drop files here")
                    .desired_width(width),
            );
            let can_attach = !path_input.trim().is_empty() && !session.ingesting();
            if ui.add_enabled(can_attach, egui::Button::new("Attach")).clicked() {
                actions.push(UiAction::AttachPaths(parse_paths(path_input)));
                path_input.clear();
            }
            let has_images = !session.attachments().is_empty() || session.ingesting();
            if ui
                .add_enabled(has_images, egui::Button::new("Clear images"))
                .clicked()
            {
                actions.push(UiAction::ClearAttachments);
            }
        });
        ui.label(muted(theme, "Up to 5 images, 5 MB each."));

        ui.horizontal(|ui| {
            let label = if session.loading() { "Asking..." } else { "Send" };
            let send = egui::Button::new(RichText::new(label).color(theme.text_on_accent))
                .fill(theme.accent_primary);
            if ui.add_enabled(session.can_ask(), send).clicked() {
                actions.push(UiAction::Ask);
            }
            if ui.button("Clear").clicked() {
                actions.push(UiAction::Clear);
            }
            if session.ingesting() {
                ui.spinner();
                ui.label(muted(theme, "Preparing images..."));
            }
        });
    });
}

fn attachment_strip(
    ui: &mut egui::Ui,
    session: &SessionState,
    theme: &Theme,
    textures: &[egui::TextureHandle],
    actions: &mut Vec<UiAction>,
) {
    if session.attachments().is_empty() {
        return;
    }

    ui.horizontal_wrapped(|ui| {
        for (index, attachment) in session.attachments().iter().enumerate() {
            theme.thumbnail_frame().show(ui, |ui| {
                ui.vertical(|ui| {
                    if let Some(texture) = textures.get(index) {
                        let size = egui::vec2(theme.thumbnail_size, theme.thumbnail_size);
                        let response = ui
                            .add(
                                egui::Image::new(SizedTexture::from_handle(texture))
                                    .max_size(size)
                                    .sense(egui::Sense::click()),
                            )
                            .on_hover_text(attachment.path.display().to_string());
                        if response.clicked() {
                            actions.push(UiAction::OpenViewer(index));
                        }
                    }
                    if ui.small_button("Remove").clicked() {
                        actions.push(UiAction::RemoveAttachment(index));
                    }
                });
            });
        }
    });
}

pub fn role_badge(ui: &mut egui::Ui, session: &SessionState, theme: &Theme) {
    let Some(role) = session.role() else {
        return;
    };
    ui.horizontal(|ui| {
        ui.label(muted(theme, "Selected role:"));
        badge(ui, role, theme.neutral_badge());
    });
}

pub fn clarification_card(
    ui: &mut egui::Ui,
    session: &mut SessionState,
    theme: &Theme,
    actions: &mut Vec<UiAction>,
) {
    if !session.needs_clarification() {
        return;
    }

    theme.card_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.heading("A few more details");
        ui.label(muted(theme, format!("About: {}", session.query().trim())));
        ui.label(muted(theme, "Answer what you can. Blank answers are fine."));
        ui.separator();

        let editable = session.phase() == Phase::AwaitingClarification;
        let questions = session.questions().to_vec();
        for (index, question) in questions.iter().enumerate() {
            ui.strong(format!("Q{}. {question}", index + 1));
            if let Some(slot) = session.clarification_answer_mut(index) {
                ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(slot)
                        .hint_text("Your answer")
                        .desired_width(f32::INFINITY),
                );
            }
        }

        ui.add_space(theme.spacing_8);
        let answered = session
            .clarification_answers()
            .iter()
            .filter(|answer| !answer.trim().is_empty())
            .count();
        ui.label(muted(theme, format!("Answered {answered} of {}", questions.len())));
        let label = if session.loading() {
            "Sending..."
        } else if session.ingesting() {
            "Preparing images..."
        } else {
            "Confirm and generate answer"
        };
        let submit = egui::Button::new(RichText::new(label).color(theme.text_on_accent))
            .fill(theme.accent_primary);
        if ui.add_enabled(session.can_clarify(), submit).clicked() {
            actions.push(UiAction::Clarify);
        }
    });
}

pub fn answer_card(ui: &mut egui::Ui, session: &SessionState, theme: &Theme) {
    if let Some(error) = session.error() {
        theme.card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.heading("Answer");
            ui.separator();
            ui.label(RichText::new(error).color(theme.danger));
        });
        return;
    }

    let Some(answer) = session.answer() else {
        return;
    };
    theme.card_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.heading("Answer");
        ui.separator();
        ui.label(answer);
        ui.separator();
        ui.horizontal_wrapped(|ui| {
            ui.label(muted(theme, "Quality check:"));
            if session.judge() == Some(true) {
                badge(ui, "OK", theme.pass_badge());
            } else {
                badge(ui, "Needs work", theme.fail_badge());
            }
            if let Some(reason) = session.reason() {
                ui.label(muted(theme, format!("(Reason: {reason})")));
            }
        });
    });
}

pub fn alert_modal(ctx: &egui::Context, message: &str, actions: &mut Vec<UiAction>) {
    let response = egui::Modal::new(egui::Id::new("alert_modal")).show(ctx, |ui| {
        ui.set_max_width(380.0);
        ui.strong("Notice");
        ui.label(message);
        ui.add_space(6.0);
        ui.button("OK").clicked()
    });
    if response.inner || response.should_close() {
        actions.push(UiAction::DismissAlert);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_paths;
    use std::path::PathBuf;

    #[test]
    fn parse_paths_splits_on_newlines_and_semicolons() {
        let paths = parse_paths(" /a/one.png ;/b/two.jpg\n\n  /c/three.gif ; ");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/a/one.png"),
                PathBuf::from("/b/two.jpg"),
                PathBuf::from("/c/three.gif"),
            ]
        );
    }

    #[test]
    fn parse_paths_of_blank_input_is_empty() {
        assert!(parse_paths("  ;\n ").is_empty());
    }
}
