use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::aggregate;
use crate::data::groups::{self, EXPLAINER_GROUPS};
use crate::data::model::{ExplanationDataset, FeatureExplanation, ScoreField};

// ---------------------------------------------------------------------------
// Sequential ramps – one hue family per explainer group
// ---------------------------------------------------------------------------

/// Normalized metric positions are squeezed into this intensity sub-range;
/// the low end of a sequential ramp is too washed out to read on white.
const INTENSITY_LO: f32 = 0.3;
const INTENSITY_HI: f32 = 1.0;

/// Intensity used for a group's single representative color (legends,
/// selection strokes).
const BASE_INTENSITY: f32 = 0.8;

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// A point on a sequential light→dark ramp around one hue.
///
/// `hue_deg = None` is the neutral grey ramp for explainers outside every
/// registered group.
fn ramp_color(hue_deg: Option<f32>, intensity: f32) -> Color32 {
    let t = intensity.clamp(0.0, 1.0);
    let lightness = 0.88 - 0.53 * t;
    let saturation = match hue_deg {
        Some(_) => 0.35 + 0.45 * t,
        None => 0.0,
    };
    hsl_to_color32(Hsl::new(hue_deg.unwrap_or(0.0), saturation, lightness))
}

/// Generates `n` visually distinct colours using evenly spaced hues, for
/// categorical encodings (the cluster map).
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n.max(1) as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.7, 0.5))
        })
        .collect()
}

/// Grey used for unclustered (noise) points and unknown explainers.
pub const NEUTRAL: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);

// ---------------------------------------------------------------------------
// ColorScheme – metric value + explainer identity → color
// ---------------------------------------------------------------------------

/// Color assignment for the active metric over the current dataset.
///
/// A scheme captures its normalization domain at construction and is
/// rebuilt whenever the metric or the dataset changes; nothing inside it
/// memoizes, so a stale domain cannot survive a metric switch.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    metric: ScoreField,
    domain: [f64; 2],
}

impl ColorScheme {
    /// Build a scheme for `metric`, deriving the domain from the dataset.
    pub fn new(dataset: &ExplanationDataset, metric: ScoreField) -> Self {
        ColorScheme {
            metric,
            domain: aggregate::extent(dataset, metric),
        }
    }

    pub fn metric(&self) -> ScoreField {
        self.metric
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// Linear position of a metric value inside the intensity sub-range.
    fn intensity(&self, value: f64) -> f32 {
        let [lo, hi] = self.domain;
        let width = hi - lo;
        let t = if width == 0.0 { 0.5 } else { (value - lo) / width };
        (INTENSITY_LO + (INTENSITY_HI - INTENSITY_LO) * t as f32).clamp(INTENSITY_LO, INTENSITY_HI)
    }

    /// Fill color for one record: the record's group ramp indexed by its
    /// metric value. A missing value normalizes as 0; an unknown explainer
    /// uses the grey ramp. Never fails.
    pub fn color_for(&self, rec: &FeatureExplanation) -> Color32 {
        let hue = groups::match_group(&rec.llm_explainer).map(|g| g.hue_deg);
        let value = self.metric.value_or_zero(rec);
        ramp_color(hue, self.intensity(value))
    }

    /// Legend entries: (group name, ramp low end, ramp high end).
    pub fn legend_entries(&self) -> Vec<(&'static str, Color32, Color32)> {
        EXPLAINER_GROUPS
            .iter()
            .map(|g| {
                (
                    g.name,
                    ramp_color(Some(g.hue_deg), INTENSITY_LO),
                    ramp_color(Some(g.hue_deg), INTENSITY_HI),
                )
            })
            .collect()
    }
}

/// One representative color per explainer group, independent of any data
/// value. Used for selection strokes and the detail panel's name tints.
pub fn base_color(llm_explainer: &str) -> Color32 {
    match groups::match_group(llm_explainer) {
        Some(g) => ramp_color(Some(g.hue_deg), BASE_INTENSITY),
        None => NEUTRAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(explainer: &str, detection: Option<f64>) -> FeatureExplanation {
        FeatureExplanation {
            feature_id: 1,
            explanation_index: None,
            llm_explainer: explainer.to_string(),
            score_detection: detection,
            score_embedding: None,
            score_fuzz: None,
            total_score: None,
            similarity_mean: None,
            similarity_var: None,
            x: 0.0,
            y: 0.0,
            cluster_id: 0,
            text: String::new(),
        }
    }

    fn scheme(values: &[Option<f64>]) -> (ExplanationDataset, ColorScheme) {
        let records = values
            .iter()
            .map(|&v| record("meta-llama/llama-3", v))
            .collect();
        let ds = ExplanationDataset::from_records(records);
        let scheme = ColorScheme::new(&ds, ScoreField::Detection);
        (ds, scheme)
    }

    #[test]
    fn domain_comes_from_present_values_only() {
        let (_, scheme) = scheme(&[Some(0.2), None, Some(0.8)]);
        assert_eq!(scheme.domain(), [0.2, 0.8]);
    }

    #[test]
    fn empty_dataset_falls_back_to_unit_domain() {
        let ds = ExplanationDataset::default();
        let scheme = ColorScheme::new(&ds, ScoreField::Detection);
        assert_eq!(scheme.domain(), [0.0, 1.0]);
    }

    #[test]
    fn higher_scores_render_darker() {
        let (ds, scheme) = scheme(&[Some(0.0), Some(1.0)]);
        let low = scheme.color_for(&ds.records[0]);
        let high = scheme.color_for(&ds.records[1]);
        let luma = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(luma(high) < luma(low));
    }

    #[test]
    fn groups_get_distinct_hue_families() {
        let (_, s) = scheme(&[Some(0.0), Some(1.0)]);
        let llama = s.color_for(&record("meta-llama/llama-3", Some(0.5)));
        let gemini = s.color_for(&record("google/gemini-flash-1.5", Some(0.5)));
        let gpt = s.color_for(&record("openai/gpt-4o-mini", Some(0.5)));
        assert_ne!(llama, gemini);
        assert_ne!(gemini, gpt);
        assert_ne!(llama, gpt);
    }

    #[test]
    fn unknown_explainer_gets_the_grey_ramp() {
        let (_, s) = scheme(&[Some(0.0), Some(1.0)]);
        let c = s.color_for(&record("unknown/foo", Some(0.5)));
        assert_eq!(c.r(), c.g());
        assert_eq!(c.g(), c.b());
        assert_eq!(base_color("unknown/foo"), NEUTRAL);
    }

    #[test]
    fn missing_metric_value_still_produces_a_color() {
        let (_, s) = scheme(&[Some(0.2), Some(0.8)]);
        // Missing → 0, which lies below the domain; clamped to the ramp floor.
        let c = s.color_for(&record("meta-llama/llama-3", None));
        let floor = s.color_for(&record("meta-llama/llama-3", Some(0.2)));
        assert_eq!(c, floor);
    }

    #[test]
    fn degenerate_domain_is_total() {
        let (ds, scheme) = scheme(&[Some(0.5), Some(0.5)]);
        // All values equal: every record gets the same mid-ramp color.
        assert_eq!(
            scheme.color_for(&ds.records[0]),
            scheme.color_for(&ds.records[1])
        );
    }

    #[test]
    fn categorical_palette_spreads_hues() {
        let palette = generate_palette(6);
        assert_eq!(palette.len(), 6);
        assert_ne!(palette[0], palette[3]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn base_colors_differ_per_group() {
        let a = base_color("meta-llama/llama-3");
        let b = base_color("google/gemini-flash-1.5");
        let c = base_color("qwen/qwen-2.5-7b");
        assert_ne!(a, b);
        assert_ne!(b, c);
    }
}
