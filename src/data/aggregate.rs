use std::collections::BTreeMap;

use super::model::{ExplanationDataset, ScoreField};

// ---------------------------------------------------------------------------
// Per-feature aggregation
// ---------------------------------------------------------------------------

/// Mean of each requested metric over all of one feature's explanations.
pub type FeatureAggregate = BTreeMap<ScoreField, f64>;

/// Group records by `feature_id` and average each requested metric.
///
/// Missing values count as 0 in the numerator and stay in the denominator:
/// an explainer that produced no score drags the feature's mean down, which
/// is the ranking behavior the table expects. One entry per feature, so
/// multi-explainer features are never double-counted by aggregate views.
pub fn aggregate_by_feature(
    dataset: &ExplanationDataset,
    fields: &[ScoreField],
) -> BTreeMap<u32, FeatureAggregate> {
    let mut sums: BTreeMap<u32, (usize, BTreeMap<ScoreField, f64>)> = BTreeMap::new();

    for rec in &dataset.records {
        let (count, per_field) = sums.entry(rec.feature_id).or_default();
        *count += 1;
        for &field in fields {
            *per_field.entry(field).or_insert(0.0) += field.value_or_zero(rec);
        }
    }

    sums.into_iter()
        .map(|(feature_id, (count, per_field))| {
            let means = per_field
                .into_iter()
                .map(|(field, sum)| (field, sum / count as f64))
                .collect();
            (feature_id, means)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Extents (color / axis domains)
// ---------------------------------------------------------------------------

/// `[min, max]` over the present, finite values of an accessor.
///
/// Falls back to `[0, 1]` when nothing valid exists so downstream
/// normalization never divides by a degenerate domain.
pub fn extent_by<I>(values: I) -> [f64; 2]
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().flatten() {
        if !v.is_finite() {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        [0.0, 1.0]
    } else {
        [min, max]
    }
}

/// Domain of a metric over the whole dataset.
///
/// Recomputed on every dataset or metric change; nothing caches this across
/// a metric switch.
pub fn extent(dataset: &ExplanationDataset, field: ScoreField) -> [f64; 2] {
    extent_by(dataset.records.iter().map(|r| field.value(r)))
}

/// x/y domains of the 2D projection, shared by the cluster map so panning a
/// filtered view never rescales the axes.
pub fn projection_extent(dataset: &ExplanationDataset) -> ([f64; 2], [f64; 2]) {
    let xs = extent_by(dataset.records.iter().map(|r| Some(r.x)));
    let ys = extent_by(dataset.records.iter().map(|r| Some(r.y)));
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FeatureExplanation;

    fn record(feature_id: u32, detection: Option<f64>) -> FeatureExplanation {
        FeatureExplanation {
            feature_id,
            explanation_index: None,
            llm_explainer: "openai/gpt-4o-mini".to_string(),
            score_detection: detection,
            score_embedding: None,
            score_fuzz: None,
            total_score: None,
            similarity_mean: None,
            similarity_var: None,
            x: 0.0,
            y: 0.0,
            cluster_id: -1,
            text: String::new(),
        }
    }

    #[test]
    fn mean_counts_missing_values_in_the_denominator() {
        let ds = ExplanationDataset::from_records(vec![
            record(7, Some(0.2)),
            record(7, Some(0.8)),
            record(7, None),
        ]);
        let agg = aggregate_by_feature(&ds, &[ScoreField::Detection]);
        let mean = agg[&7][&ScoreField::Detection];
        assert!((mean - (0.2 + 0.8) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn aggregation_yields_one_entry_per_feature() {
        let ds = ExplanationDataset::from_records(vec![
            record(1, Some(0.4)),
            record(1, Some(0.6)),
            record(2, Some(1.0)),
        ]);
        let agg = aggregate_by_feature(&ds, &[ScoreField::Detection]);
        assert_eq!(agg.len(), 2);
        assert!((agg[&1][&ScoreField::Detection] - 0.5).abs() < 1e-12);
        assert!((agg[&2][&ScoreField::Detection] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn extent_skips_missing_values() {
        let values = vec![Some(0.1), None, Some(0.9), Some(0.5)];
        assert_eq!(extent_by(values), [0.1, 0.9]);
    }

    #[test]
    fn extent_of_nothing_is_unit_interval() {
        assert_eq!(extent_by(vec![None, None]), [0.0, 1.0]);
        assert_eq!(extent(&ExplanationDataset::default(), ScoreField::Fuzz), [0.0, 1.0]);
    }

    #[test]
    fn extent_of_a_single_value_collapses() {
        assert_eq!(extent_by(vec![Some(0.4)]), [0.4, 0.4]);
    }
}
