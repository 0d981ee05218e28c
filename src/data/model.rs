use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ScoreField – the rankable / colorable quality metrics
// ---------------------------------------------------------------------------

/// One of the scalar quality metrics attached to an explanation.
///
/// The `column` name doubles as the JSON / CSV / Parquet field name, so the
/// loader and the engines agree on spelling in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScoreField {
    Detection,
    Embedding,
    Fuzz,
    Total,
}

impl ScoreField {
    /// All metrics, in display order.
    pub const ALL: [ScoreField; 4] = [
        ScoreField::Detection,
        ScoreField::Embedding,
        ScoreField::Fuzz,
        ScoreField::Total,
    ];

    /// Field name in the dataset files.
    pub fn column(self) -> &'static str {
        match self {
            ScoreField::Detection => "score_detection",
            ScoreField::Embedding => "score_embedding",
            ScoreField::Fuzz => "score_fuzz",
            ScoreField::Total => "total_score",
        }
    }

    /// Short human-readable label for radio buttons and table headers.
    pub fn label(self) -> &'static str {
        match self {
            ScoreField::Detection => "Detection",
            ScoreField::Embedding => "Embedding",
            ScoreField::Fuzz => "Fuzz",
            ScoreField::Total => "Total",
        }
    }

    /// The metric's value on a record, `None` when the file omitted it.
    pub fn value(self, rec: &FeatureExplanation) -> Option<f64> {
        match self {
            ScoreField::Detection => rec.score_detection,
            ScoreField::Embedding => rec.score_embedding,
            ScoreField::Fuzz => rec.score_fuzz,
            ScoreField::Total => rec.total_score,
        }
    }

    /// Missing metrics rank as 0 rather than poisoning a sort.
    pub fn value_or_zero(self, rec: &FeatureExplanation) -> f64 {
        self.value(rec).unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// FeatureExplanation – one row of the source dataset
// ---------------------------------------------------------------------------

/// One explanation of one feature by one LLM explainer.
///
/// `feature_id` is the join key across every view; a feature usually carries
/// one record per explainer and may carry several per explainer when an
/// explainer made multiple passes (disambiguated by `explanation_index`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureExplanation {
    pub feature_id: u32,
    pub explanation_index: Option<u32>,
    /// Full explainer identifier, e.g. `"openai/gpt-4o-mini"`. Group
    /// membership is a case-insensitive substring match, see `data::groups`.
    pub llm_explainer: String,
    pub score_detection: Option<f64>,
    pub score_embedding: Option<f64>,
    pub score_fuzz: Option<f64>,
    /// Precomputed mean of the three scores; absent in older dataset versions.
    pub total_score: Option<f64>,
    pub similarity_mean: Option<f64>,
    pub similarity_var: Option<f64>,
    /// 2D projection (UMAP) coordinate. Not necessarily identical across
    /// records sharing a `feature_id`.
    pub x: f64,
    pub y: f64,
    /// Semantic cluster label; negative means unclustered noise.
    pub cluster_id: i32,
    #[serde(default)]
    pub text: String,
}

// ---------------------------------------------------------------------------
// ExplanationDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset, immutable for as long as it is held.
#[derive(Debug, Clone, Default)]
pub struct ExplanationDataset {
    /// All explanation records, in file order.
    pub records: Vec<FeatureExplanation>,
    /// Number of distinct `feature_id`s.
    pub n_features: usize,
    /// Largest non-negative cluster label, -1 when nothing is clustered.
    pub max_cluster_id: i32,
}

impl ExplanationDataset {
    /// Wrap loaded records and precompute the cheap summary facts the UI
    /// asks for every frame.
    pub fn from_records(records: Vec<FeatureExplanation>) -> Self {
        let mut ids: Vec<u32> = records.iter().map(|r| r.feature_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let max_cluster_id = records
            .iter()
            .map(|r| r.cluster_id)
            .filter(|&c| c >= 0)
            .max()
            .unwrap_or(-1);

        ExplanationDataset {
            n_features: ids.len(),
            max_cluster_id,
            records,
        }
    }

    /// Number of explanation records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(feature_id: u32, cluster_id: i32) -> FeatureExplanation {
        FeatureExplanation {
            feature_id,
            explanation_index: None,
            llm_explainer: "openai/gpt-4o-mini".to_string(),
            score_detection: Some(0.5),
            score_embedding: None,
            score_fuzz: None,
            total_score: None,
            similarity_mean: Some(0.4),
            similarity_var: Some(0.01),
            x: 0.0,
            y: 0.0,
            cluster_id,
            text: String::new(),
        }
    }

    #[test]
    fn dataset_counts_distinct_features() {
        let ds = ExplanationDataset::from_records(vec![
            record(1, 0),
            record(1, 0),
            record(2, 3),
            record(9, -1),
        ]);
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.n_features, 3);
        assert_eq!(ds.max_cluster_id, 3);
    }

    #[test]
    fn empty_dataset_has_noise_cluster_sentinel() {
        let ds = ExplanationDataset::from_records(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.max_cluster_id, -1);
    }

    #[test]
    fn missing_metric_ranks_as_zero() {
        let rec = record(1, 0);
        assert_eq!(ScoreField::Embedding.value(&rec), None);
        assert_eq!(ScoreField::Embedding.value_or_zero(&rec), 0.0);
        assert_eq!(ScoreField::Detection.value_or_zero(&rec), 0.5);
    }

    #[test]
    fn record_deserializes_with_absent_optional_fields() {
        let json = r#"{
            "feature_id": 7,
            "llm_explainer": "meta-llama/llama-3.1-8b",
            "x": 1.5,
            "y": -2.0,
            "cluster_id": -1
        }"#;
        let rec: FeatureExplanation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.feature_id, 7);
        assert_eq!(rec.explanation_index, None);
        assert_eq!(rec.score_detection, None);
        assert_eq!(rec.total_score, None);
        assert_eq!(rec.similarity_mean, None);
        assert_eq!(rec.text, "");
    }
}
