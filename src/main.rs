mod app;
mod color;
mod data;
mod panel;
mod state;
mod stats;
mod ui;

use std::path::PathBuf;

use app::SalaryScopeApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    // Optional CLI argument: a combined survey file to load at startup.
    let startup_file: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);

    eframe::run_native(
        "Salary Scope – Survey Dashboard",
        options,
        Box::new(move |_cc| {
            let mut app = SalaryScopeApp::default();
            if let Some(path) = startup_file {
                match data::loader::load_file(&path) {
                    Ok(dataset) => {
                        log::info!("Loaded {} records from {}", dataset.len(), path.display());
                        app.state.set_combined(dataset);
                    }
                    Err(e) => {
                        log::error!("Failed to load {}: {e:#}", path.display());
                        app.state.status_message = Some(format!("Error: {e:#}"));
                    }
                }
            }
            Ok(Box::new(app))
        }),
    )
}
