use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{ExplanationDataset, FeatureExplanation, ScoreField};

/// Loader failures callers may want to distinguish from generic I/O noise.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an explanation dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat scalar columns, one row per explanation
/// * `.json`    – `[{ "feature_id": 0, "llm_explainer": "...", ... }, ...]`
/// * `.csv`     – flat header + one row per explanation
pub fn load_file(path: &Path) -> Result<ExplanationDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the pipeline's
/// `df.to_dict(orient='records')` output):
///
/// ```json
/// [
///   {
///     "feature_id": 12,
///     "explanation_index": 0,
///     "llm_explainer": "openai/gpt-4o-mini",
///     "score_detection": 0.81,
///     "similarity_mean": 0.44,
///     "similarity_var": 0.012,
///     "x": -3.1, "y": 7.9,
///     "cluster_id": 4,
///     "text": "..."
///   },
///   ...
/// ]
/// ```
///
/// Optional fields may be `null` or absent; unknown keys are ignored.
fn load_json(path: &Path) -> Result<ExplanationDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<FeatureExplanation> =
        serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(ExplanationDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one explanation per row.
/// Empty cells in optional columns become `None`.
fn load_csv(path: &Path) -> Result<ExplanationDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

    let feature_idx = require("feature_id")?;
    let explainer_idx = require("llm_explainer")?;
    let x_idx = require("x")?;
    let y_idx = require("y")?;
    let cluster_idx = require("cluster_id")?;

    let expl_index_idx = find("explanation_index");
    let detection_idx = find(ScoreField::Detection.column());
    let embedding_idx = find(ScoreField::Embedding.column());
    let fuzz_idx = find(ScoreField::Fuzz.column());
    let total_idx = find(ScoreField::Total.column());
    let sim_mean_idx = find("similarity_mean");
    let sim_var_idx = find("similarity_var");
    let text_idx = find("text");

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();
        let opt_cell = |idx: Option<usize>| idx.map(|i| cell(i)).filter(|s| !s.is_empty());

        let opt_f64 = |idx: Option<usize>| -> Result<Option<f64>> {
            opt_cell(idx)
                .map(|s| {
                    s.parse::<f64>()
                        .with_context(|| format!("CSV row {row_no}: '{s}' is not a number"))
                })
                .transpose()
        };

        records.push(FeatureExplanation {
            feature_id: cell(feature_idx)
                .parse()
                .with_context(|| format!("CSV row {row_no}: invalid feature_id"))?,
            explanation_index: opt_cell(expl_index_idx)
                .map(|s| {
                    s.parse()
                        .with_context(|| format!("CSV row {row_no}: invalid explanation_index"))
                })
                .transpose()?,
            llm_explainer: cell(explainer_idx).to_string(),
            score_detection: opt_f64(detection_idx)?,
            score_embedding: opt_f64(embedding_idx)?,
            score_fuzz: opt_f64(fuzz_idx)?,
            total_score: opt_f64(total_idx)?,
            similarity_mean: opt_f64(sim_mean_idx)?,
            similarity_var: opt_f64(sim_var_idx)?,
            x: cell(x_idx)
                .parse()
                .with_context(|| format!("CSV row {row_no}: invalid x"))?,
            y: cell(y_idx)
                .parse()
                .with_context(|| format!("CSV row {row_no}: invalid y"))?,
            cluster_id: cell(cluster_idx)
                .parse()
                .with_context(|| format!("CSV row {row_no}: invalid cluster_id"))?,
            text: opt_cell(text_idx).unwrap_or("").to_string(),
        });
    }

    Ok(ExplanationDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of explanation records.
///
/// Expected schema: flat scalar columns named like the JSON keys. Integer
/// columns may be Int32 or Int64, float columns Float32 or Float64; nulls
/// in optional columns become `None`. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<ExplanationDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let feature_col = required_column(&batch, "feature_id")?;
        let explainer_col = required_column(&batch, "llm_explainer")?;
        let x_col = required_column(&batch, "x")?;
        let y_col = required_column(&batch, "y")?;
        let cluster_col = required_column(&batch, "cluster_id")?;

        let expl_index_col = optional_column(&batch, "explanation_index");
        let detection_col = optional_column(&batch, ScoreField::Detection.column());
        let embedding_col = optional_column(&batch, ScoreField::Embedding.column());
        let fuzz_col = optional_column(&batch, ScoreField::Fuzz.column());
        let total_col = optional_column(&batch, ScoreField::Total.column());
        let sim_mean_col = optional_column(&batch, "similarity_mean");
        let sim_var_col = optional_column(&batch, "similarity_var");
        let text_col = optional_column(&batch, "text");

        for row in 0..batch.num_rows() {
            let opt_score = |col: Option<&Arc<dyn Array>>| col.and_then(|c| extract_f64(c, row));

            records.push(FeatureExplanation {
                feature_id: extract_i64(feature_col, row)
                    .with_context(|| format!("Row {row}: invalid 'feature_id'"))?
                    as u32,
                explanation_index: expl_index_col
                    .and_then(|c| extract_i64(c, row).ok())
                    .map(|v| v as u32),
                llm_explainer: extract_string(explainer_col, row).unwrap_or_default(),
                score_detection: opt_score(detection_col),
                score_embedding: opt_score(embedding_col),
                score_fuzz: opt_score(fuzz_col),
                total_score: opt_score(total_col),
                similarity_mean: opt_score(sim_mean_col),
                similarity_var: opt_score(sim_var_col),
                x: extract_f64(x_col, row)
                    .with_context(|| format!("Row {row}: invalid 'x'"))?,
                y: extract_f64(y_col, row)
                    .with_context(|| format!("Row {row}: invalid 'y'"))?,
                cluster_id: extract_i64(cluster_col, row)
                    .with_context(|| format!("Row {row}: invalid 'cluster_id'"))?
                    as i32,
                text: text_col
                    .and_then(|c| extract_string(c, row))
                    .unwrap_or_default(),
            });
        }
    }

    Ok(ExplanationDataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn required_column<'a>(
    batch: &'a arrow::record_batch::RecordBatch,
    name: &'static str,
) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema_ref()
        .index_of(name)
        .map_err(|_| LoadError::MissingColumn(name))?;
    Ok(batch.column(idx))
}

fn optional_column<'a>(
    batch: &'a arrow::record_batch::RecordBatch,
    name: &str,
) -> Option<&'a Arc<dyn Array>> {
    batch
        .schema_ref()
        .index_of(name)
        .ok()
        .map(|idx| batch.column(idx))
}

/// Numeric value at `row`, coercing Float32/Float64/Int32/Int64. Nulls and
/// non-numeric columns yield `None`.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>()?;
            Some(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>()?;
            Some(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>()?;
            Some(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>()?;
            Some(arr.value(row) as f64)
        }
        _ => None,
    }
}

/// Integer value at `row`, accepting Int32 or Int64 columns.
fn extract_i64(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value in integer column");
    }
    match col.data_type() {
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Ok(arr.value(row))
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row) as i64)
        }
        other => bail!("expected integer column, got {other:?}"),
    }
}

/// String value at `row`; booleans stringified for robustness against
/// loosely-typed writers.
fn extract_string(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>()?;
            Some(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>()?;
            Some(arr.value(row).to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JSON_FIXTURE: &str = r#"[
        {
            "feature_id": 1,
            "explanation_index": 0,
            "llm_explainer": "openai/gpt-4o-mini",
            "score_detection": 0.8,
            "score_embedding": 0.6,
            "score_fuzz": null,
            "total_score": 0.7,
            "similarity_mean": 0.45,
            "similarity_var": 0.01,
            "x": 1.0,
            "y": 2.0,
            "cluster_id": 0,
            "text": "fires on mentions of rivers"
        },
        {
            "feature_id": 1,
            "llm_explainer": "meta-llama/llama-3.1-8b",
            "x": 1.1,
            "y": 2.2,
            "cluster_id": -1
        }
    ]"#;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn json_records_load_with_nulls_and_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.json", JSON_FIXTURE);
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.n_features, 1);
        assert_eq!(ds.records[0].score_fuzz, None);
        assert_eq!(ds.records[1].total_score, None);
        assert_eq!(ds.records[1].cluster_id, -1);
    }

    #[test]
    fn csv_records_load_with_empty_optional_cells() {
        let csv = "\
feature_id,explanation_index,llm_explainer,score_detection,score_embedding,score_fuzz,total_score,similarity_mean,similarity_var,x,y,cluster_id,text
3,0,google/gemini-flash-1.5,0.9,0.5,0.4,0.6,0.5,0.02,-1.5,0.5,2,activates on dates
4,,unknown/foo,,,,,,,0.0,1.0,-1,
";
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.csv", csv);
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].feature_id, 3);
        assert_eq!(ds.records[0].score_detection, Some(0.9));
        assert_eq!(ds.records[1].explanation_index, None);
        assert_eq!(ds.records[1].score_detection, None);
        assert_eq!(ds.records[1].similarity_mean, None);
        assert_eq!(ds.records[1].text, "");
    }

    #[test]
    fn csv_missing_required_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.csv", "feature_id,x,y\n1,0.0,0.0\n");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("llm_explainer"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.pkl", "not a dataset");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported file extension"));
    }

    #[test]
    fn parquet_roundtrip_preserves_records_and_nulls() {
        use arrow::array::{Float64Builder, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("feature_id", DataType::Int64, false),
            Field::new("llm_explainer", DataType::Utf8, false),
            Field::new("score_detection", DataType::Float64, true),
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
            Field::new("cluster_id", DataType::Int64, false),
        ]));

        let mut detection = Float64Builder::new();
        detection.append_value(0.75);
        detection.append_null();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![10, 11])),
                Arc::new(StringArray::from(vec!["openai/gpt-4o-mini", "qwen/qwen-2.5"])),
                Arc::new(detection.finish()),
                Arc::new(Float64Array::from(vec![0.5, -0.5])),
                Arc::new(Float64Array::from(vec![1.5, 2.5])),
                Arc::new(Int64Array::from(vec![0, -1])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].feature_id, 10);
        assert_eq!(ds.records[0].score_detection, Some(0.75));
        assert_eq!(ds.records[1].score_detection, None);
        assert_eq!(ds.records[1].cluster_id, -1);
        // Columns the file does not carry come back as None.
        assert_eq!(ds.records[0].similarity_mean, None);
    }
}
