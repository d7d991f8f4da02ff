/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RecordSet (Result coerced, missing → None)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ RecordSet  │  Vec<Record>, distinct-value index per field
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → derived RecordSet (input untouched)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
