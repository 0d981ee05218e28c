use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::color::base_color;
use crate::data::aggregate::aggregate_by_feature;
use crate::data::model::ScoreField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Detail panel (bottom-right panel)
// ---------------------------------------------------------------------------

fn score_triplet(detection: Option<f64>, embedding: Option<f64>, fuzz: Option<f64>) -> String {
    let fmt = |v: Option<f64>| match v {
        Some(v) => format!("{v:.2}"),
        None => "–".to_string(),
    };
    format!("{} / {} / {}", fmt(detection), fmt(embedding), fmt(fuzz))
}

/// Every explanation of the selected feature, regardless of filters: the
/// panel answers "what did each explainer say", so hiding a group elsewhere
/// must not censor it here. The selected explainer's card is highlighted.
pub fn detail_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(feature_id) = state.selection.feature_id else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new("Select a feature to view details").italics());
        });
        return;
    };

    let siblings: Vec<usize> = state
        .dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.feature_id == feature_id)
        .map(|(i, _)| i)
        .collect();

    if siblings.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new("Select a feature to view details").italics());
        });
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.heading(format!("Feature {feature_id}"));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            ui.label(RichText::new("detection / embedding / fuzz").small().strong());
        });
    });

    // Mean over every explanation of this feature, so multi-explainer
    // features read as one entity.
    let fields = [ScoreField::Detection, ScoreField::Embedding, ScoreField::Fuzz];
    if let Some(means) = aggregate_by_feature(&state.dataset, &fields).get(&feature_id) {
        ui.label(
            RichText::new(format!(
                "feature mean  {:.2} / {:.2} / {:.2}",
                means[&ScoreField::Detection],
                means[&ScoreField::Embedding],
                means[&ScoreField::Fuzz]
            ))
            .small()
            .color(ui.visuals().weak_text_color()),
        );
    }
    ui.separator();

    let mut clicked: Option<(u32, String)> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for &i in &siblings {
                let rec = &state.dataset.records[i];
                let highlighted = state.selection.is_record(rec.feature_id, &rec.llm_explainer);

                let mut frame = egui::Frame::group(ui.style());
                if highlighted {
                    frame = frame.fill(ui.visuals().selection.bg_fill.linear_multiply(0.3));
                }
                let response = frame
                    .show(ui, |ui: &mut Ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui: &mut Ui| {
                            ui.label(
                                RichText::new(&rec.llm_explainer)
                                    .strong()
                                    .color(base_color(&rec.llm_explainer)),
                            );
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui: &mut Ui| {
                                    ui.monospace(score_triplet(
                                        rec.score_detection,
                                        rec.score_embedding,
                                        rec.score_fuzz,
                                    ));
                                },
                            );
                        });
                        ui.label(RichText::new(&rec.text).weak());
                    })
                    .response;

                if response.interact(egui::Sense::click()).clicked() {
                    clicked = Some((rec.feature_id, rec.llm_explainer.clone()));
                }
                ui.add_space(4.0);
            }
        });

    if let Some((feature_id, explainer)) = clicked {
        state.select(feature_id, Some(explainer.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_triplet_marks_missing_scores() {
        assert_eq!(score_triplet(Some(0.8), None, Some(0.25)), "0.80 / – / 0.25");
        assert_eq!(score_triplet(None, None, None), "– / – / –");
    }
}
