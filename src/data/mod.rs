/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, drop invalid rows → Dataset (memoized)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, ordinal grades, observed ranges
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterCriteria → FilteredView + summary stats
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  grouped means, correlation, PCA, top-N, histogram
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered subset → CSV
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
