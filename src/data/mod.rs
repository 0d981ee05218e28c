/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ExplanationDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────┐
///   │ ExplanationDataset  │  Vec<FeatureExplanation>, immutable
///   └────────────────────┘
///        │
///        ├──────────────────────────┐
///        ▼                          ▼
///   ┌──────────┐              ┌───────────┐
///   │  filter   │ visible set │ aggregate  │ per-feature means,
///   │           │ table ranks │            │ color / axis extents
///   └──────────┘              └───────────┘
/// ```
///
/// Everything below the loader is a pure function of (dataset, parameters):
/// the views re-derive from scratch on every state change instead of
/// patching incrementally.

pub mod aggregate;
pub mod filter;
pub mod groups;
pub mod loader;
pub mod model;
