use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One synthetic explanation record, pre-serialization.
struct Record {
    feature_id: i64,
    explanation_index: i64,
    llm_explainer: String,
    score_detection: Option<f64>,
    score_embedding: Option<f64>,
    score_fuzz: Option<f64>,
    total_score: Option<f64>,
    similarity_mean: f64,
    similarity_var: f64,
    x: f64,
    y: f64,
    cluster_id: i64,
    text: String,
}

const N_FEATURES: usize = 300;
const N_CLUSTERS: usize = 8;
/// Fraction of features left unclustered (DBSCAN noise).
const NOISE_FRACTION: f64 = 0.1;
/// Fraction of scores dropped to exercise missing-value handling.
const MISSING_FRACTION: f64 = 0.03;

/// (identifier, mean quality) per explainer; quality drives both the score
/// distributions and the similarity statistics so the dataset looks like a
/// real run where better explainers agree with themselves more.
const EXPLAINERS: [(&str, f64); 4] = [
    ("meta-llama/llama-3.1-8b-instruct", 0.55),
    ("google/gemini-flash-1.5", 0.65),
    ("openai/gpt-4o-mini", 0.7),
    ("qwen/qwen-2.5-7b-instruct", 0.6),
];

const SUBJECTS: [&str; 8] = [
    "mentions of rivers and lakes",
    "dates written in ISO format",
    "legal boilerplate phrases",
    "python function definitions",
    "first-person narration",
    "chemical element names",
    "negated statements",
    "citations of academic papers",
];

const VERBS: [&str; 4] = ["activates on", "fires for", "responds to", "tracks"];

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn make_records(rng: &mut SimpleRng) -> Vec<Record> {
    // Cluster centers spread over the projection plane.
    let centers: Vec<(f64, f64)> = (0..N_CLUSTERS)
        .map(|_| (rng.gauss(0.0, 4.0), rng.gauss(0.0, 4.0)))
        .collect();

    let mut records = Vec::new();

    for feature_id in 0..N_FEATURES as i64 {
        let is_noise = rng.next_f64() < NOISE_FRACTION;
        let cluster_id = if is_noise {
            -1
        } else {
            (rng.next_u64() % N_CLUSTERS as u64) as i64
        };
        let (cx, cy) = if is_noise {
            (rng.gauss(0.0, 6.0), rng.gauss(0.0, 6.0))
        } else {
            centers[cluster_id as usize]
        };

        let subject = rng.pick(&SUBJECTS);

        for (explainer, quality) in EXPLAINERS {
            let mut score = |spread: f64| -> Option<f64> {
                if rng.next_f64() < MISSING_FRACTION {
                    None
                } else {
                    Some(clamp01(rng.gauss(quality, spread)))
                }
            };
            let detection = score(0.12);
            let embedding = score(0.1);
            let fuzz = score(0.15);
            let total = detection.map(|d| {
                (d + embedding.unwrap_or(0.0) + fuzz.unwrap_or(0.0)) / 3.0
            });

            records.push(Record {
                feature_id,
                explanation_index: 0,
                llm_explainer: explainer.to_string(),
                score_detection: detection,
                score_embedding: embedding,
                score_fuzz: fuzz,
                total_score: total,
                similarity_mean: clamp01(0.2 + 0.5 * quality + rng.gauss(0.0, 0.05)),
                similarity_var: rng.gauss(0.03, 0.02).abs().min(0.12),
                x: cx + rng.gauss(0.0, 0.6),
                y: cy + rng.gauss(0.0, 0.6),
                cluster_id,
                text: format!("This feature {} {subject}.", rng.pick(&VERBS)),
            });
        }
    }

    records
}

fn write_parquet(records: &[Record], path: &str) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("feature_id", DataType::Int64, false),
        Field::new("explanation_index", DataType::Int64, false),
        Field::new("llm_explainer", DataType::Utf8, false),
        Field::new("score_detection", DataType::Float64, true),
        Field::new("score_embedding", DataType::Float64, true),
        Field::new("score_fuzz", DataType::Float64, true),
        Field::new("total_score", DataType::Float64, true),
        Field::new("similarity_mean", DataType::Float64, false),
        Field::new("similarity_var", DataType::Float64, false),
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
        Field::new("cluster_id", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
    ]));

    let mut feature_id = Int64Builder::new();
    let mut explanation_index = Int64Builder::new();
    let mut llm_explainer = StringBuilder::new();
    let mut score_detection = Float64Builder::new();
    let mut score_embedding = Float64Builder::new();
    let mut score_fuzz = Float64Builder::new();
    let mut total_score = Float64Builder::new();
    let mut similarity_mean = Float64Builder::new();
    let mut similarity_var = Float64Builder::new();
    let mut x = Float64Builder::new();
    let mut y = Float64Builder::new();
    let mut cluster_id = Int64Builder::new();
    let mut text = StringBuilder::new();

    for rec in records {
        feature_id.append_value(rec.feature_id);
        explanation_index.append_value(rec.explanation_index);
        llm_explainer.append_value(&rec.llm_explainer);
        score_detection.append_option(rec.score_detection);
        score_embedding.append_option(rec.score_embedding);
        score_fuzz.append_option(rec.score_fuzz);
        total_score.append_option(rec.total_score);
        similarity_mean.append_value(rec.similarity_mean);
        similarity_var.append_value(rec.similarity_var);
        x.append_value(rec.x);
        y.append_value(rec.y);
        cluster_id.append_value(rec.cluster_id);
        text.append_value(&rec.text);
    }

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(feature_id.finish()),
            Arc::new(explanation_index.finish()),
            Arc::new(llm_explainer.finish()),
            Arc::new(score_detection.finish()),
            Arc::new(score_embedding.finish()),
            Arc::new(score_fuzz.finish()),
            Arc::new(total_score.finish()),
            Arc::new(similarity_mean.finish()),
            Arc::new(similarity_var.finish()),
            Arc::new(x.finish()),
            Arc::new(y.finish()),
            Arc::new(cluster_id.finish()),
            Arc::new(text.finish()),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn write_json(records: &[Record], path: &str) {
    let values: Vec<serde_json::Value> = records
        .iter()
        .map(|rec| {
            json!({
                "feature_id": rec.feature_id,
                "explanation_index": rec.explanation_index,
                "llm_explainer": rec.llm_explainer,
                "score_detection": rec.score_detection,
                "score_embedding": rec.score_embedding,
                "score_fuzz": rec.score_fuzz,
                "total_score": rec.total_score,
                "similarity_mean": rec.similarity_mean,
                "similarity_var": rec.similarity_var,
                "x": rec.x,
                "y": rec.y,
                "cluster_id": rec.cluster_id,
                "text": rec.text,
            })
        })
        .collect();

    let text = serde_json::to_string_pretty(&values).expect("Failed to serialize JSON");
    std::fs::write(path, text).expect("Failed to write JSON file");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let records = make_records(&mut rng);

    write_parquet(&records, "sample_data.parquet");
    write_json(&records, "sample_data.json");

    println!(
        "Wrote {} explanations ({} features × {} explainers) to sample_data.parquet / sample_data.json",
        records.len(),
        N_FEATURES,
        EXPLAINERS.len()
    );
}
