use eframe::egui::{self, Color32, Ui};
use egui_plot::{Line, LineStyle, Plot, PlotBounds, PlotPoint, PlotPoints, Points};

use crate::color::{self, base_color};
use crate::data::aggregate;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Shared hit-testing
// ---------------------------------------------------------------------------

/// How close (as a fraction of the plot's span) the pointer must be to a
/// point for clicks and tooltips to land on it.
const PICK_RADIUS: f64 = 0.025;

/// Index of the point nearest the pointer, normalized by the plot bounds so
/// picking behaves the same regardless of zoom.
fn nearest_point(
    pointer: PlotPoint,
    bounds: PlotBounds,
    coords: &[[f64; 2]],
) -> Option<usize> {
    let width = bounds.width().max(f64::EPSILON);
    let height = bounds.height().max(f64::EPSILON);

    let mut best: Option<(usize, f64)> = None;
    for (i, &[x, y]) in coords.iter().enumerate() {
        let dx = (x - pointer.x) / width;
        let dy = (y - pointer.y) / height;
        let dist = dx * dx + dy * dy;
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }
    best.filter(|&(_, d)| d.sqrt() <= PICK_RADIUS).map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Similarity scatter (left plot)
// ---------------------------------------------------------------------------

/// Scatter of the visible records at (similarity_mean, similarity_var),
/// filled with the active metric's color ramp. Clicking a point selects its
/// feature *and* its explainer row.
pub fn similarity_scatter(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to view explanations  (File → Open…)");
        });
        return;
    }

    // Records without similarity statistics have no position in this plot.
    let mut coords: Vec<[f64; 2]> = Vec::new();
    let mut indices: Vec<usize> = Vec::new();
    for &i in &state.visible {
        let rec = &state.dataset.records[i];
        if let (Some(mean), Some(var)) = (rec.similarity_mean, rec.similarity_var) {
            coords.push([mean, var]);
            indices.push(i);
        }
    }

    let colors: Vec<Color32> = indices
        .iter()
        .map(|&i| state.color_scheme.color_for(&state.dataset.records[i]))
        .collect();

    let selected: Vec<usize> = indices
        .iter()
        .enumerate()
        .filter(|&(_, &i)| {
            state
                .selection
                .is_feature(state.dataset.records[i].feature_id)
        })
        .map(|(pos, _)| pos)
        .collect();

    let response = Plot::new("similarity_scatter")
        .x_axis_label("Similarity Average")
        .y_axis_label("Similarity Variance")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (pos, (&coord, &color)) in coords.iter().zip(colors.iter()).enumerate() {
                let is_selected = selected.contains(&pos);
                if is_selected {
                    // Stroke ring in the explainer's base color underneath
                    // the enlarged fill.
                    let stroke = base_color(&state.dataset.records[indices[pos]].llm_explainer);
                    plot_ui.points(
                        Points::new(PlotPoints::from(vec![coord]))
                            .radius(6.0)
                            .color(stroke),
                    );
                }
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![coord]))
                        .radius(if is_selected { 4.5 } else { 2.0 })
                        .color(color),
                );
            }

            // Connect the selected feature's sibling points so the spread of
            // one feature across explainers is readable.
            if selected.len() > 1 {
                let mut ring: Vec<[f64; 2]> = selected.iter().map(|&pos| coords[pos]).collect();
                if ring.len() > 2 {
                    ring.push(ring[0]);
                }
                plot_ui.line(
                    Line::new(PlotPoints::from(ring))
                        .color(Color32::from_gray(85))
                        .width(1.5)
                        .style(LineStyle::Dashed { length: 4.0 }),
                );
            }

            (
                plot_ui.pointer_coordinate(),
                plot_ui.plot_bounds(),
                plot_ui.response().clicked(),
            )
        });

    let (pointer, bounds, clicked) = response.inner;
    let hovered = pointer.and_then(|p| nearest_point(p, bounds, &coords));

    if let Some(pos) = hovered {
        let rec = &state.dataset.records[indices[pos]];
        let metric = state.color_scheme.metric();
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new("similarity_scatter_tip"),
            |ui: &mut Ui| {
                ui.strong(format!("Feature {}", rec.feature_id));
                ui.label(&rec.llm_explainer);
                ui.label(format!("Sim Avg: {:.3}", rec.similarity_mean.unwrap_or(0.0)));
                ui.label(format!("Sim Var: {:.4}", rec.similarity_var.unwrap_or(0.0)));
                ui.label(format!(
                    "{}: {:.2}",
                    metric.label(),
                    metric.value_or_zero(rec)
                ));
            },
        );
        if clicked {
            let (feature_id, explainer) = {
                let rec = &state.dataset.records[indices[pos]];
                (rec.feature_id, rec.llm_explainer.clone())
            };
            state.select(feature_id, Some(explainer.as_str()));
        }
    }
}

// ---------------------------------------------------------------------------
// Cluster map (right plot)
// ---------------------------------------------------------------------------

/// Scatter of the visible records at their 2D projection coordinate,
/// colored by cluster. Clicking selects the feature with no explainer
/// narrowing, so the detail panel shows every explanation.
pub fn cluster_map(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data");
        });
        return;
    }

    let coords: Vec<[f64; 2]> = state
        .visible
        .iter()
        .map(|&i| {
            let rec = &state.dataset.records[i];
            [rec.x, rec.y]
        })
        .collect();

    // One palette for the whole frame; per-point lookups reuse it.
    let n_clusters = (state.dataset.max_cluster_id + 1).max(1) as usize;
    let palette = color::generate_palette(n_clusters);
    let fill_for = |cluster_id: i32| -> Color32 {
        if cluster_id < 0 {
            color::NEUTRAL
        } else {
            palette[cluster_id as usize % n_clusters]
        }
    };

    // Axes always span the full dataset so filtering never rescales the map.
    let ([x_lo, x_hi], [y_lo, y_hi]) = aggregate::projection_extent(&state.dataset);

    let response = Plot::new("cluster_map")
        .x_axis_label("UMAP Dimension 1")
        .y_axis_label("UMAP Dimension 2")
        .include_x(x_lo)
        .include_x(x_hi)
        .include_y(y_lo)
        .include_y(y_hi)
        .show(ui, |plot_ui| {
            for (pos, &i) in state.visible.iter().enumerate() {
                let rec = &state.dataset.records[i];
                let is_selected = state.selection.is_feature(rec.feature_id);
                let (radius, fill) = if is_selected {
                    (5.0, Color32::from_rgb(0xef, 0x44, 0x44))
                } else {
                    (3.0, fill_for(rec.cluster_id))
                };
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![coords[pos]]))
                        .radius(radius)
                        .color(fill),
                );
            }

            (
                plot_ui.pointer_coordinate(),
                plot_ui.plot_bounds(),
                plot_ui.response().clicked(),
            )
        });

    let (pointer, bounds, clicked) = response.inner;
    let hovered = pointer.and_then(|p| nearest_point(p, bounds, &coords));

    if let Some(pos) = hovered {
        let rec = &state.dataset.records[state.visible[pos]];
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new("cluster_map_tip"),
            |ui: &mut Ui| {
                ui.strong(format!("Feature {}", rec.feature_id));
                ui.label(&rec.llm_explainer);
                ui.label(format!("Cluster ID: {}", rec.cluster_id));
                ui.label(format!("X: {:.2}   Y: {:.2}", rec.x, rec.y));
            },
        );
        if clicked {
            let feature_id = rec.feature_id;
            state.select(feature_id, None);
        }
    }
}
