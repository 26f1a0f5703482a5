/// Data layer: core types, loading, and subsetting.
///
/// Architecture:
/// ```text
///  .csv / .tsv spreadsheet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse rows → DataMatrix (items × features)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ SimilarityMatrix │  items × items percentages (see `similarity`)
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  leading / named item subsets
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
