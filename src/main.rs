mod api;
mod app;
mod attachments;
mod config;
mod event;
mod session;
mod theme;
mod ui;
mod worker;

use api::AskClient;
use app::AskApp;
use config::Config;
use eframe::egui;
use std::sync::mpsc;
use theme::Theme;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::AskWorker;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ask_then_answer=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env();
    info!(
        api = %config.ask_url(),
        timeout_secs = config.request_timeout.as_secs(),
        "starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ask-then-answer-runtime")
        .build()?;

    let client = AskClient::new(&config)?;
    let (tx, rx) = mpsc::channel();
    let mut worker = AskWorker::new(client, tx, runtime.handle().clone());
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 820.0])
            .with_min_inner_size([640.0, 520.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Ask Then Answer",
        native_options,
        Box::new(move |creation_context| {
            let theme = Theme::default();
            theme.apply_visuals(&creation_context.egui_ctx);
            let repaint_ctx = creation_context.egui_ctx.clone();
            worker.set_repaint(move || repaint_ctx.request_repaint());
            Ok(Box::new(AskApp::new(rx, worker, theme)))
        }),
    )?;

    Ok(())
}
