use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// Errors raised by the data, similarity, simulation and rendering layers.
///
/// Per-cell data problems never end up here: an unparsable cognacy entry is
/// recorded as missing and the load continues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no header row", path.display())]
    MissingHeader { path: PathBuf },

    #[error("{} contains no items", path.display())]
    EmptyDataset { path: PathBuf },

    #[error("item '{name}' appears more than once")]
    DuplicateItem { name: String },

    /// Two items share no feature observed in both, so their similarity
    /// has no denominator.
    #[error("similarity of '{first}' and '{second}' is undefined: no comparable features")]
    UndefinedSimilarity { first: String, second: String },

    #[error("unknown noise distribution '{0}' (expected 'uniform' or 'binomial')")]
    UnknownDistribution(String),

    #[error("invalid noise parameters: {0}")]
    InvalidNoise(String),

    #[error("subset of {requested} items requested, but the matrix has {available}")]
    SubsetOutOfRange { requested: usize, available: usize },

    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("failed to render {}: {message}", path.display())]
    Render { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
