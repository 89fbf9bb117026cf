//! Session Flow
//!
//! Desktop dashboard that draws user navigation between transactions as a
//! Sankey diagram, colored by latency or misery.

mod api;
mod app;
mod color;
mod filters;
mod flow;
mod insights;
mod navigation;
mod query;
mod settings;
mod summary;
mod tags;
mod theme;

use eframe::egui;

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_title("Session Flow"),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(
        "Session Flow",
        options,
        Box::new(|cc| Ok(Box::new(app::DashboardApp::new(cc)))),
    )
}
