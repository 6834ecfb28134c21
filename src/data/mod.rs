/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → MeasurementTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ MeasurementTable │  Vec<MeasurementRow>, station index
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  StationFilter → matching rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  rows → DerivedViews (means, changes, extremes, correlation)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ insights  │  DerivedViews → narrative lines
///   └──────────┘
/// ```

pub mod filter;
pub mod insights;
pub mod loader;
pub mod model;
pub mod pipeline;
