use crate::color::ColorScheme;
use crate::data::filter::{
    compute_table_rows, compute_visible, FilterState, ScoreRange, TableRow,
};
use crate::data::model::{ExplanationDataset, ScoreField};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The (feature, explainer) pair every view renders against.
///
/// `explainer` narrows the selection to one row of the feature's explanation
/// group when the triggering view knows which row was clicked; views without
/// explainer context (the cluster map) clear it back to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub feature_id: Option<u32>,
    pub explainer: Option<String>,
}

impl SelectionState {
    pub fn is_feature(&self, feature_id: u32) -> bool {
        self.feature_id == Some(feature_id)
    }

    pub fn is_record(&self, feature_id: u32, explainer: &str) -> bool {
        self.is_feature(feature_id) && self.explainer.as_deref() == Some(explainer)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// All mutation goes through the named transition functions below; each one
/// ends by re-deriving the cached projections (`visible`, `table_rows`,
/// `color_scheme`) from scratch, so the views can never observe a half
/// updated state.
pub struct AppState {
    /// Loaded dataset; empty until a file is loaded.
    pub dataset: ExplanationDataset,

    /// Live filter parameters.
    pub filters: FilterState,

    /// Shared selection, mutated by any view, observed by all.
    pub selection: SelectionState,

    /// Rank-table sort key (independent of the coloring metric).
    pub sort_key: ScoreField,

    /// Indices of records passing the current filters (cached).
    pub visible: Vec<usize>,

    /// Ranked table rows for the current thresholds and sort key (cached).
    pub table_rows: Vec<TableRow>,

    /// Color assignment for the active metric over the current dataset.
    pub color_scheme: ColorScheme,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        let dataset = ExplanationDataset::default();
        let filters = FilterState::default();
        let color_scheme = ColorScheme::new(&dataset, filters.active_metric);
        let mut state = AppState {
            dataset,
            filters,
            selection: SelectionState::default(),
            sort_key: ScoreField::Total,
            visible: Vec::new(),
            table_rows: Vec::new(),
            color_scheme,
            status_message: None,
        };
        state.refresh();
        state
    }
}

impl AppState {
    /// Re-derive every cached projection from the current dataset and
    /// parameters. Runs to completion synchronously; recomputation is cheap
    /// at the dataset sizes involved (thousands of records).
    fn refresh(&mut self) {
        self.visible = compute_visible(&self.dataset, &self.filters);
        self.table_rows = compute_table_rows(&self.dataset, &self.filters, self.sort_key);
        self.color_scheme = ColorScheme::new(&self.dataset, self.filters.active_metric);
    }

    /// Replace the dataset wholesale (startup load or File → Open), resetting
    /// filters and selection to their defaults.
    pub fn set_dataset(&mut self, dataset: ExplanationDataset) {
        self.dataset = dataset;
        self.filters = FilterState::default();
        self.selection = SelectionState::default();
        self.status_message = None;
        self.refresh();
    }

    /// Select a feature, optionally narrowing to one explainer's row.
    ///
    /// Both fields are set atomically: selecting from a view with no
    /// explainer context overwrites any previous narrowing with `None`.
    /// There is no deselection; a selection outlives filters that hide it.
    pub fn select(&mut self, feature_id: u32, explainer: Option<&str>) {
        self.selection = SelectionState {
            feature_id: Some(feature_id),
            explainer: explainer.map(str::to_string),
        };
    }

    /// Hide or unhide one feature everywhere except the rank table.
    pub fn toggle_exclusion(&mut self, feature_id: u32) {
        if !self.filters.excluded_ids.remove(&feature_id) {
            self.filters.excluded_ids.insert(feature_id);
        }
        self.refresh();
    }

    /// Switch the coloring metric. Any configured score range belonged to
    /// the previous metric and must never silently apply to the new one, so
    /// it resets to `Full`.
    pub fn set_active_metric(&mut self, metric: ScoreField) {
        if self.filters.active_metric == metric {
            return;
        }
        self.filters.active_metric = metric;
        self.filters.score_range = ScoreRange::Full;
        self.refresh();
    }

    /// Restrict visibility to a band of the active metric.
    pub fn set_score_range(&mut self, range: ScoreRange) {
        self.filters.score_range = range;
        self.refresh();
    }

    pub fn set_min_similarity(&mut self, value: f64) {
        self.filters.min_similarity = value;
        self.refresh();
    }

    pub fn set_max_variance(&mut self, value: f64) {
        self.filters.max_variance = value;
        self.refresh();
    }

    /// Show or hide one explainer group.
    pub fn toggle_group(&mut self, name: &str) {
        if !self.filters.visible_groups.remove(name) {
            self.filters.visible_groups.insert(name.to_string());
        }
        self.refresh();
    }

    /// Change the rank table's sort key.
    pub fn set_sort_key(&mut self, key: ScoreField) {
        if self.sort_key == key {
            return;
        }
        self.sort_key = key;
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FeatureExplanation;

    fn record(feature_id: u32, explainer: &str) -> FeatureExplanation {
        FeatureExplanation {
            feature_id,
            explanation_index: None,
            llm_explainer: explainer.to_string(),
            score_detection: Some(0.5),
            score_embedding: Some(0.5),
            score_fuzz: Some(0.5),
            total_score: Some(0.5),
            similarity_mean: Some(0.5),
            similarity_var: Some(0.05),
            x: 0.0,
            y: 0.0,
            cluster_id: 0,
            text: String::new(),
        }
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(ExplanationDataset::from_records(vec![
            record(7, "meta-llama/llama-3"),
            record(7, "openai/gpt-4o-mini"),
            record(8, "openai/gpt-4o-mini"),
        ]));
        state
    }

    #[test]
    fn select_sets_both_axes_atomically() {
        let mut state = loaded_state();
        state.select(7, Some("meta/llama-3"));
        assert_eq!(state.selection.feature_id, Some(7));
        assert_eq!(state.selection.explainer.as_deref(), Some("meta/llama-3"));

        // A view without explainer context overwrites the narrowing.
        state.select(7, None);
        assert_eq!(state.selection.feature_id, Some(7));
        assert_eq!(state.selection.explainer, None);
    }

    #[test]
    fn metric_switch_resets_the_score_range() {
        let mut state = loaded_state();
        state.set_score_range(ScoreRange::Global([0.4, 0.6]));
        assert_ne!(state.filters.score_range, ScoreRange::Full);

        state.set_active_metric(ScoreField::Fuzz);
        assert_eq!(state.filters.score_range, ScoreRange::Full);
    }

    #[test]
    fn reselecting_the_same_metric_keeps_the_range() {
        let mut state = loaded_state();
        state.set_score_range(ScoreRange::Global([0.4, 0.6]));
        state.set_active_metric(state.filters.active_metric);
        assert_eq!(state.filters.score_range, ScoreRange::Global([0.4, 0.6]));
    }

    #[test]
    fn excluding_the_selected_feature_keeps_the_selection() {
        let mut state = loaded_state();
        state.select(7, Some("openai/gpt-4o-mini"));
        state.toggle_exclusion(7);

        // Feature 7 is hidden from the visible set...
        assert!(state
            .visible
            .iter()
            .all(|&i| state.dataset.records[i].feature_id != 7));
        // ...but the selection deliberately persists.
        assert_eq!(state.selection.feature_id, Some(7));
    }

    #[test]
    fn hiding_the_selected_group_keeps_the_selection() {
        let mut state = loaded_state();
        state.select(8, Some("openai/gpt-4o-mini"));
        state.toggle_group("GPT-4o-mini");
        assert!(state.visible.len() == 1);
        assert_eq!(state.selection.feature_id, Some(8));
    }

    #[test]
    fn exclusion_toggles_back_on() {
        let mut state = loaded_state();
        let before = state.visible.clone();
        state.toggle_exclusion(8);
        state.toggle_exclusion(8);
        assert_eq!(state.visible, before);
    }

    #[test]
    fn caches_track_filter_changes() {
        let mut state = loaded_state();
        assert_eq!(state.visible.len(), 3);
        assert_eq!(state.table_rows.len(), 3);

        state.set_max_variance(0.01);
        assert!(state.table_rows.is_empty());
        // The visible pipeline does not use the variance threshold.
        assert_eq!(state.visible.len(), 3);
    }

    #[test]
    fn set_dataset_resets_filters_and_selection() {
        let mut state = loaded_state();
        state.select(7, None);
        state.toggle_group("Llama");
        state.set_dataset(ExplanationDataset::from_records(vec![record(
            1,
            "meta-llama/llama-3",
        )]));
        assert_eq!(state.selection, SelectionState::default());
        assert!(state.filters.visible_groups.contains("Llama"));
        assert_eq!(state.visible.len(), 1);
    }

    #[test]
    fn color_scheme_follows_the_active_metric() {
        let mut state = loaded_state();
        assert_eq!(state.color_scheme.metric(), ScoreField::Detection);
        state.set_active_metric(ScoreField::Embedding);
        assert_eq!(state.color_scheme.metric(), ScoreField::Embedding);
    }
}
