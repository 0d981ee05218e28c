use eframe::egui::{self, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::visible_feature_ids;
use crate::data::model::ScoreField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Rank table (bottom-left panel)
// ---------------------------------------------------------------------------

/// Ranked explanation rows with their global standing.
///
/// Ranks come from the full threshold-filtered set, so hiding an explainer
/// group leaves gaps in the rank column instead of renumbering. The "Vis"
/// checkbox drives per-feature exclusion; clicking a row selects its
/// feature and explainer.
pub fn rank_table(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new("No dataset loaded").italics());
        });
        return;
    }

    let rows = state.table_rows.clone();
    let shown_ids = visible_feature_ids(&state.dataset, &state.visible);

    let mut clicked: Option<(u32, String)> = None;
    let mut toggled: Option<u32> = None;
    let mut new_sort_key: Option<ScoreField> = None;

    TableBuilder::new(ui)
        .striped(true)
        .sense(Sense::click())
        .column(Column::auto().at_least(40.0))
        .column(Column::remainder())
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(30.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Rank");
            });
            header.col(|ui| {
                ui.strong("Explainer (Feature)");
            });
            header.col(|ui| {
                let current = state.sort_key;
                egui::ComboBox::from_id_salt("rank_sort_key")
                    .selected_text(current.label())
                    .show_ui(ui, |ui: &mut Ui| {
                        for field in ScoreField::ALL {
                            if ui
                                .selectable_label(current == field, field.label())
                                .clicked()
                            {
                                new_sort_key = Some(field);
                            }
                        }
                    });
            });
            header.col(|ui| {
                ui.strong("Vis");
            });
        })
        .body(|body| {
            body.rows(22.0, rows.len(), |mut row| {
                let table_row = rows[row.index()];
                let rec = &state.dataset.records[table_row.index];
                row.set_selected(state.selection.is_feature(rec.feature_id));

                row.col(|ui| {
                    ui.monospace(table_row.global_rank.to_string());
                });
                row.col(|ui| {
                    ui.vertical(|ui: &mut Ui| {
                        ui.label(format!("Feature {}", rec.feature_id));
                        ui.label(
                            RichText::new(&rec.llm_explainer)
                                .small()
                                .color(ui.visuals().weak_text_color()),
                        );
                    });
                });
                row.col(|ui| {
                    match state.sort_key.value(rec) {
                        Some(v) => ui.monospace(format!("{v:.3}")),
                        None => ui.monospace("–"),
                    };
                });
                row.col(|ui| {
                    let mut shown = shown_ids.contains(&rec.feature_id);
                    if ui.checkbox(&mut shown, "").changed() {
                        toggled = Some(rec.feature_id);
                    }
                });

                if row.response().clicked() {
                    clicked = Some((rec.feature_id, rec.llm_explainer.clone()));
                }
            });
        });

    if let Some(key) = new_sort_key {
        state.set_sort_key(key);
    }
    if let Some(feature_id) = toggled {
        state.toggle_exclusion(feature_id);
    }
    if let Some((feature_id, explainer)) = clicked {
        state.select(feature_id, Some(explainer.as_str()));
    }
}
