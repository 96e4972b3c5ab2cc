/// Data layer: table model, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Table (schema checked)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table   │  columns + rows of Value
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  year / continent / missing-value selection
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export  │  Arrow RecordBatch, pretty text, JSON records
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
