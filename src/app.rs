use crate::attachments::SelectedFile;
use crate::event::AppEvent;
use crate::session::SessionState;
use crate::theme::Theme;
use crate::ui::{self, lightbox::lightbox, UiAction};
use crate::worker::AskWorker;
use eframe::egui::{self, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::{debug, warn};

pub struct AskApp {
    rx: Receiver<AppEvent>,
    worker: AskWorker,
    theme: Theme,
    session: SessionState,
    path_input: String,
    textures: Vec<egui::TextureHandle>,
    textures_revision: Option<u64>,
}

impl AskApp {
    pub fn new(rx: Receiver<AppEvent>, worker: AskWorker, theme: Theme) -> Self {
        Self {
            rx,
            worker,
            theme,
            session: SessionState::default(),
            path_input: String::new(),
            textures: Vec::new(),
            textures_revision: None,
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::AskCompleted {
                ticket,
                phase,
                result,
            } => {
                debug!(ticket, phase = phase.as_str(), "ask completed");
                self.session.complete_ask(ticket, result);
            }
            AppEvent::AttachmentsIngested { ticket, result } => {
                self.session.complete_ingest(ticket, result);
            }
        }
    }

    fn select_paths(&mut self, paths: Vec<PathBuf>) {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match SelectedFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(err) => {
                    self.session.raise_alert(err.to_string());
                    return;
                }
            }
        }

        if let Some(dispatch) = self.session.select_files(files) {
            self.worker.ingest(dispatch);
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::Ask => {
                if let Some(dispatch) = self.session.begin_ask() {
                    self.worker.ask(dispatch);
                }
            }
            UiAction::Clarify => {
                if let Some(dispatch) = self.session.begin_clarify() {
                    self.worker.ask(dispatch);
                }
            }
            UiAction::Clear => {
                self.worker.cancel_all();
                self.session.clear();
                self.path_input.clear();
            }
            UiAction::AttachPaths(paths) => self.select_paths(paths),
            UiAction::ClearAttachments => self.session.clear_attachments(),
            UiAction::RemoveAttachment(index) => self.session.remove_attachment(index),
            UiAction::OpenViewer(index) => self.session.open_viewer(index),
            UiAction::ViewerNext => self.session.viewer_next(),
            UiAction::ViewerPrev => self.session.viewer_prev(),
            UiAction::CloseViewer => self.session.close_viewer(),
            UiAction::DismissAlert => self.session.dismiss_alert(),
        }
    }

    fn collect_dropped_files(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let dropped: Vec<PathBuf> = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            actions.push(UiAction::AttachPaths(dropped));
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        let revision = self.session.attachments().revision();
        if self.textures_revision == Some(revision) {
            return;
        }

        self.textures = self
            .session
            .attachments()
            .iter()
            .enumerate()
            .map(|(index, attachment)| {
                let preview = &attachment.preview;
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [preview.width as usize, preview.height as usize],
                    &preview.rgba,
                );
                ctx.load_texture(
                    format!("attachment-{revision}-{index}"),
                    image,
                    egui::TextureOptions::LINEAR,
                )
            })
            .collect();
        self.textures_revision = Some(revision);
    }

    fn render(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let drop_hover = ctx.input(|input| !input.raw.hovered_files.is_empty());
        let Self {
            theme,
            session,
            path_input,
            textures,
            ..
        } = self;

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .id_salt("page")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(theme.content_width);
                        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                            ui.add_space(theme.spacing_16);
                            ui.heading("Ask Then Answer");
                            ui.label(
                                RichText::new(
                                    "Question → clarification if needed → answer → quality check",
                                )
                                .small()
                                .color(theme.text_muted),
                            );
                            ui.add_space(theme.spacing_8);

                            ui::composer(
                                ui, session, path_input, drop_hover, theme, textures, actions,
                            );
                            ui::role_badge(ui, session, theme);
                            ui::clarification_card(ui, session, theme, actions);
                            ui::answer_card(ui, session, theme);
                            ui.add_space(theme.spacing_12);
                        });
                    });
                });
        });

        lightbox(ctx, session, textures, theme, actions);
        if let Some(message) = session.alert() {
            ui::alert_modal(ctx, message, actions);
        }
    }
}

impl eframe::App for AskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.sync_textures(ctx);

        let mut actions = Vec::new();
        self.collect_dropped_files(ctx, &mut actions);
        self.render(ctx, &mut actions);
        for action in actions {
            self.apply_action(action);
        }
    }
}

impl Drop for AskApp {
    fn drop(&mut self) {
        self.worker.shutdown();
    }
}
