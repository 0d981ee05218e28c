use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{detail, panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FeatureLensApp {
    pub state: AppState,
}

impl FeatureLensApp {
    /// Build the app, attempting the one-time startup load when a dataset
    /// path was given. A failed load leaves the dataset empty: every view
    /// degrades to "no data" instead of erroring.
    pub fn new(initial_dataset: Option<PathBuf>) -> Self {
        let mut state = AppState::default();
        if let Some(path) = initial_dataset {
            match crate::data::loader::load_file(&path) {
                Ok(dataset) => {
                    log::info!(
                        "Loaded {} explanations across {} features from {}",
                        dataset.len(),
                        dataset.n_features,
                        path.display()
                    );
                    state.set_dataset(dataset);
                }
                Err(e) => {
                    log::error!("Failed to load {}: {e:#}", path.display());
                    state.status_message = Some(format!("Error: {e:#}"));
                }
            }
        }
        Self { state }
    }
}

impl eframe::App for FeatureLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and dataset summary ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and legend ----
        egui::SidePanel::left("filter_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: rank table and detail view ----
        egui::TopBottomPanel::bottom("table_detail")
            .default_height(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.columns(2, |cols| {
                    table::rank_table(&mut cols[0], &mut self.state);
                    detail::detail_panel(&mut cols[1], &mut self.state);
                });
            });

        // ---- Central panel: linked scatterplots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                plot::similarity_scatter(&mut cols[0], &mut self.state);
                plot::cluster_map(&mut cols[1], &mut self.state);
            });
        });
    }
}
