mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::AirQualityApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let mut app = AirQualityApp::default();
    if let Some(path) = config::startup_data_path() {
        if app.state.load_from(&path).is_err() {
            log::warn!("Starting without data; open a file from the File menu");
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Air Quality Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
