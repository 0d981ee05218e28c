use std::collections::{BTreeMap, BTreeSet};

use super::groups::{ExplainerGroup, EXPLAINER_GROUPS};
use super::model::{ExplanationDataset, FeatureExplanation, ScoreField};

// ---------------------------------------------------------------------------
// Filter parameters
// ---------------------------------------------------------------------------

/// Restriction of the active metric to a numeric band.
///
/// `PerGroup` keys are group display names; a visible record is checked
/// against the range of the first registry group it matches, not against
/// every matching group.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScoreRange {
    /// No restriction.
    #[default]
    Full,
    /// One `[lo, hi]` band applied to every group.
    Global([f64; 2]),
    /// Independent bands per group; groups without an entry are unrestricted.
    PerGroup(BTreeMap<String, [f64; 2]>),
}

impl ScoreRange {
    /// The band that applies to a record matched into `group`, if any.
    fn bounds_for(&self, group: &ExplainerGroup) -> Option<[f64; 2]> {
        match self {
            ScoreRange::Full => None,
            ScoreRange::Global(bounds) => Some(*bounds),
            ScoreRange::PerGroup(map) => map.get(group.name).copied(),
        }
    }
}

/// All interactively mutable filter parameters.
///
/// Mutated only through the transition functions on `AppState`; every view
/// derives from the same instance, so there is exactly one source of truth
/// for what is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// Lower bound on `similarity_mean` (table pipeline only).
    pub min_similarity: f64,
    /// Upper bound on `similarity_var` (table pipeline only).
    pub max_variance: f64,
    /// Features explicitly hidden via the rank table's checkbox.
    pub excluded_ids: BTreeSet<u32>,
    /// Explainer groups currently shown, by display name.
    pub visible_groups: BTreeSet<String>,
    /// Metric used for coloring and the score-range restriction.
    pub active_metric: ScoreField,
    /// Optional band on `active_metric`. Reset to `Full` on metric change.
    pub score_range: ScoreRange,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            min_similarity: 0.0,
            max_variance: 0.1,
            excluded_ids: BTreeSet::new(),
            visible_groups: EXPLAINER_GROUPS
                .iter()
                .map(|g| g.name.to_string())
                .collect(),
            active_metric: ScoreField::Detection,
            score_range: ScoreRange::Full,
        }
    }
}

/// First registry group that is both visible and matches the record.
///
/// Registry order is the documented match priority, so a record whose name
/// contains several group needles lands in the earliest visible one.
fn first_visible_group(
    rec: &FeatureExplanation,
    visible_groups: &BTreeSet<String>,
) -> Option<&'static ExplainerGroup> {
    EXPLAINER_GROUPS
        .iter()
        .filter(|g| visible_groups.contains(g.name))
        .find(|g| g.matches(&rec.llm_explainer))
}

// ---------------------------------------------------------------------------
// Visible-set pipeline (scatter + cluster map)
// ---------------------------------------------------------------------------

/// Indices of records that pass the exclusion, group-visibility, and
/// score-range predicates, in dataset order.
///
/// Predicates run in this fixed order:
/// 1. `feature_id ∈ excluded_ids` → out.
/// 2. No visible group matches the explainer → out; otherwise the first
///    matching group's score-range band (if configured) must contain the
///    active metric's value. A record missing the metric fails the band.
pub fn compute_visible(dataset: &ExplanationDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if filters.excluded_ids.contains(&rec.feature_id) {
                return false;
            }
            let Some(group) = first_visible_group(rec, &filters.visible_groups) else {
                return false;
            };
            if let Some([lo, hi]) = filters.score_range.bounds_for(group) {
                match filters.active_metric.value(rec) {
                    Some(v) => v >= lo && v <= hi,
                    None => false,
                }
            } else {
                true
            }
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Table pipeline (global ranking)
// ---------------------------------------------------------------------------

/// One row of the rank table: a record index plus its global standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRow {
    pub index: usize,
    /// 1-based rank over the full threshold-filtered set, assigned before
    /// group visibility is applied. Visible rows can therefore show
    /// non-contiguous ranks; that is the point of a *global* rank.
    pub global_rank: usize,
}

/// Ranked rows for the table view.
///
/// This is deliberately a different pipeline from [`compute_visible`]:
/// similarity thresholds apply here (and not there), exclusion does not
/// apply here at all, and group visibility is applied only *after* ranks
/// are assigned.
pub fn compute_table_rows(
    dataset: &ExplanationDataset,
    filters: &FilterState,
    sort_key: ScoreField,
) -> Vec<TableRow> {
    // 1. Similarity thresholds. A record without similarity statistics
    //    fails whichever predicate tests the absent field.
    let mut passing: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            let mean_ok = rec
                .similarity_mean
                .is_some_and(|m| m >= filters.min_similarity);
            let var_ok = rec
                .similarity_var
                .is_some_and(|v| v <= filters.max_variance);
            mean_ok && var_ok
        })
        .map(|(i, _)| i)
        .collect();

    // 2. Stable descending sort on the sort key; ties keep dataset order.
    passing.sort_by(|&a, &b| {
        let va = sort_key.value_or_zero(&dataset.records[a]);
        let vb = sort_key.value_or_zero(&dataset.records[b]);
        vb.total_cmp(&va)
    });

    // 3. + 4. Rank the full set, then hide rows from invisible groups
    //    without renumbering.
    passing
        .into_iter()
        .enumerate()
        .map(|(pos, index)| TableRow {
            index,
            global_rank: pos + 1,
        })
        .filter(|row| {
            first_visible_group(&dataset.records[row.index], &filters.visible_groups).is_some()
        })
        .collect()
}

/// Distinct feature ids present in a visible-index set, for views that need
/// "is this feature visible anywhere" rather than per-record visibility.
pub fn visible_feature_ids(dataset: &ExplanationDataset, visible: &[usize]) -> BTreeSet<u32> {
    visible
        .iter()
        .map(|&i| dataset.records[i].feature_id)
        .collect()
}
