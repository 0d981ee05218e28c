use eframe::egui::{self, Color32, RichText, Sense, Ui};

use crate::data::filter::ScoreRange;
use crate::data::groups::EXPLAINER_GROUPS;
use crate::data::model::ScoreField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.dataset.is_empty() {
            ui.label(format!(
                "{} explanations across {} features, {} visible",
                state.dataset.len(),
                state.dataset.n_features,
                state.visible.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and legend
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_empty() {
        ui.label("No dataset loaded.");
        return;
    }

    // ---- Explainer groups ----
    ui.strong("Explainers");
    let mut toggled_group: Option<&'static str> = None;
    for group in &EXPLAINER_GROUPS {
        let mut shown = state.filters.visible_groups.contains(group.name);
        let label = RichText::new(group.name).color(crate::color::base_color(group.name));
        if ui.checkbox(&mut shown, label).changed() {
            toggled_group = Some(group.name);
        }
    }
    if let Some(name) = toggled_group {
        state.toggle_group(name);
    }
    ui.separator();

    // ---- Coloring metric ----
    ui.strong("Color by score");
    let current = state.filters.active_metric;
    let mut new_metric: Option<ScoreField> = None;
    for field in ScoreField::ALL {
        if ui.radio(current == field, field.label()).clicked() && current != field {
            new_metric = Some(field);
        }
    }
    if let Some(field) = new_metric {
        state.set_active_metric(field);
    }
    ui.separator();

    // ---- Score range ----
    ui.strong("Score range");
    score_range_controls(ui, state);
    ui.separator();

    // ---- Similarity thresholds (table pipeline) ----
    ui.strong("Table thresholds");
    let mut min_similarity = state.filters.min_similarity;
    if ui
        .add(egui::Slider::new(&mut min_similarity, 0.0..=1.0).text("min similarity"))
        .changed()
    {
        state.set_min_similarity(min_similarity);
    }
    let mut max_variance = state.filters.max_variance;
    if ui
        .add(egui::Slider::new(&mut max_variance, 0.0..=0.2).text("max variance"))
        .changed()
    {
        state.set_max_variance(max_variance);
    }
    ui.separator();

    // ---- Legend ----
    ui.strong("Legend");
    for (name, low, high) in state.color_scheme.legend_entries() {
        ui.horizontal(|ui: &mut Ui| {
            gradient_swatch(ui, low, high);
            ui.label(RichText::new(name).small());
        });
    }
    ui.horizontal(|ui: &mut Ui| {
        let [lo, hi] = state.color_scheme.domain();
        ui.label(
            RichText::new(format!("{lo:.2} → {hi:.2}"))
                .small()
                .color(ui.visuals().weak_text_color()),
        );
    });
}

/// Min/max sliders over the active metric. Keeping both ends at the full
/// [0, 1] span means "no restriction", matching the engine's `Full` state.
fn score_range_controls(ui: &mut Ui, state: &mut AppState) {
    let [mut lo, mut hi] = match &state.filters.score_range {
        ScoreRange::Global(bounds) => *bounds,
        _ => [0.0, 1.0],
    };

    let mut changed = false;
    changed |= ui
        .add(egui::Slider::new(&mut lo, 0.0..=1.0).text("min"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut hi, 0.0..=1.0).text("max"))
        .changed();

    if ui.small_button("Reset").clicked() {
        state.set_score_range(ScoreRange::Full);
        return;
    }

    if changed {
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        let range = if lo <= 0.0 && hi >= 1.0 {
            ScoreRange::Full
        } else {
            ScoreRange::Global([lo, hi])
        };
        state.set_score_range(range);
    }
}

/// Small horizontal low→high gradient bar.
fn gradient_swatch(ui: &mut Ui, low: Color32, high: Color32) {
    const STEPS: usize = 12;
    let (rect, _) = ui.allocate_exact_size(egui::vec2(64.0, 10.0), Sense::hover());
    if !ui.is_rect_visible(rect) {
        return;
    }
    let painter = ui.painter();
    let step_width = rect.width() / STEPS as f32;
    for s in 0..STEPS {
        let t = s as f32 / (STEPS - 1) as f32;
        let color = Color32::from_rgb(
            (low.r() as f32 + (high.r() as f32 - low.r() as f32) * t) as u8,
            (low.g() as f32 + (high.g() as f32 - low.g() as f32) * t) as u8,
            (low.b() as f32 + (high.b() as f32 - low.b() as f32) * t) as u8,
        );
        let x = rect.left() + s as f32 * step_width;
        painter.rect_filled(
            egui::Rect::from_min_size(
                egui::pos2(x, rect.top()),
                egui::vec2(step_width + 0.5, rect.height()),
            ),
            0.0,
            color,
        );
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open explanation dataset")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} explanations across {} features",
                    dataset.len(),
                    dataset.n_features
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
