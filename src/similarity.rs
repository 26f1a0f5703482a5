//! Pairwise lexical similarity with missing data.
//!
//! Two items are compared only on features observed for both. The share of
//! those features carrying the same cognacy class is their similarity:
//!
//! ```text
//!            HAND  ASH  BIG  SUN
//! Item 1        1    1    1   NA
//! Item 2        1   NA    2    1
//! Item 3        2    2    3    1
//!
//! s(1,2) = 1/2 = 50%   s(1,3) = 0/3 = 0%   s(2,3) = 1/3 ≈ 33%
//! ```
//!
//! Counting missing cells as mismatches would penalise items with sparse
//! data, so they are left out of both numerator and denominator.

use crate::data::model::{Cognacy, DataMatrix, SimilarityMatrix};
use crate::error::{Error, Result};

/// Similarity of an item with itself.
pub const IDENTITY: f64 = 100.0;

/// Result of comparing two items feature by feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Comparison {
    /// Features observed for both items with equal class labels.
    pub cognates: usize,
    /// Features observed for both items.
    pub comparable: usize,
}

impl Comparison {
    /// Cognate share as a percentage, or `None` when nothing was comparable.
    pub fn percentage(&self) -> Option<f64> {
        if self.comparable == 0 {
            return None;
        }
        Some(IDENTITY * self.cognates as f64 / self.comparable as f64)
    }
}

/// Compare two feature vectors. A feature missing on either side counts
/// neither as cognate nor as comparable.
pub fn compare(a: &[Cognacy], b: &[Cognacy]) -> Comparison {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some(x == y),
            _ => None,
        })
        .fold(Comparison::default(), |acc, cognate| Comparison {
            cognates: acc.cognates + usize::from(cognate),
            comparable: acc.comparable + 1,
        })
}

/// All-pairs similarity matrix of a dataset.
///
/// Fails with [`Error::UndefinedSimilarity`] when a pair of items has no
/// comparable feature. Items with no data at all are reported first, named
/// against themselves; otherwise the first failing pair of the upper
/// triangle in row-major order is reported.
pub fn hamming_similarity(data: &DataMatrix) -> Result<SimilarityMatrix> {
    let n = data.len();
    let items = data.items();
    let undefined = |i: usize, j: usize| Error::UndefinedSimilarity {
        first: items[i].clone(),
        second: items[j].clone(),
    };

    let mut values = vec![0.0; n * n];
    for i in 0..n {
        values[i * n + i] = compare(data.row(i), data.row(i))
            .percentage()
            .ok_or_else(|| undefined(i, i))?;
    }
    for i in 0..n {
        for j in i + 1..n {
            let pct = compare(data.row(i), data.row(j))
                .percentage()
                .ok_or_else(|| undefined(i, j))?;
            values[i * n + j] = pct;
            values[j * n + i] = pct;
        }
    }

    log::debug!("Computed {n}x{n} similarity matrix over {} features", data.features().len());
    let similarity = SimilarityMatrix::from_values(data.items().to_vec(), values);
    debug_assert!(similarity.is_symmetric());
    Ok(similarity)
}
