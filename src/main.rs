mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::FeatureLensApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional dataset to load at startup: `feature-lens data.parquet`
    let initial_dataset = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Feature Lens – Explanation Score Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(FeatureLensApp::new(initial_dataset)))),
    )
}
