use std::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Cognacy – a single cell of the data matrix
// ---------------------------------------------------------------------------

/// A cognacy-class label, or `None` when the source cell held no usable number.
pub type Cognacy = Option<u32>;

// ---------------------------------------------------------------------------
// DataMatrix – items × features
// ---------------------------------------------------------------------------

/// The parsed cognacy table. Rows are items (languages, doculects), columns
/// are features (concepts, glosses). Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    items: Vec<String>,
    features: Vec<String>,
    rows: Vec<Vec<Cognacy>>,
}

impl DataMatrix {
    /// Build a matrix, checking shape and item-name uniqueness.
    ///
    /// Rows shorter than the feature list are padded with missing cells.
    pub fn new(
        items: Vec<String>,
        features: Vec<String>,
        mut rows: Vec<Vec<Cognacy>>,
    ) -> Result<Self> {
        for (i, name) in items.iter().enumerate() {
            if items[..i].contains(name) {
                return Err(Error::DuplicateItem { name: name.clone() });
            }
        }
        for row in &mut rows {
            row.resize(features.len(), None);
        }
        debug_assert_eq!(items.len(), rows.len());
        Ok(DataMatrix {
            items,
            features,
            rows,
        })
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// The cognacy values of item `i`, in feature order.
    pub fn row(&self, i: usize) -> &[Cognacy] {
        &self.rows[i]
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of observed (non-missing) cells of item `i`.
    pub fn observed(&self, i: usize) -> usize {
        self.rows[i].iter().filter(|c| c.is_some()).count()
    }

    /// Fraction of all cells that are missing.
    pub fn missing_ratio(&self) -> f64 {
        let total = self.items.len() * self.features.len();
        if total == 0 {
            return 0.0;
        }
        let observed: usize = (0..self.len()).map(|i| self.observed(i)).sum();
        (total - observed) as f64 / total as f64
    }
}

// ---------------------------------------------------------------------------
// SimilarityMatrix – items × items, percentages
// ---------------------------------------------------------------------------

/// Square matrix of pairwise similarity percentages, labelled by item.
///
/// Values are stored row-major. The constructors in this crate keep it
/// symmetric with a diagonal of 100.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Wrap row-major values. `values.len()` must be `labels.len()²`.
    pub fn from_values(labels: Vec<String>, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            labels.len() * labels.len(),
            "similarity matrix must be square"
        );
        SimilarityMatrix { labels, values }
    }

    /// Build from nested rows, e.g. literals in tests.
    #[cfg(test)]
    pub fn from_rows(labels: Vec<String>, rows: &[Vec<f64>]) -> Self {
        let values = rows.iter().flatten().copied().collect();
        Self::from_values(labels, values)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.len() + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.len();
        &self.values[i * n..(i + 1) * n]
    }

    /// Position of an item label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Whether `get(i, j) == get(j, i)` holds everywhere.
    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (i + 1..n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Sub-matrix over the given item indices, in the given order.
    pub(crate) fn reindexed(&self, indices: &[usize]) -> SimilarityMatrix {
        let labels = indices.iter().map(|&i| self.labels[i].clone()).collect();
        let values = indices
            .iter()
            .flat_map(|&i| indices.iter().map(move |&j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .collect();
        SimilarityMatrix { labels, values }
    }
}

impl fmt::Display for SimilarityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels.iter().map(|l| l.len()).max().unwrap_or(0);
        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{label:<width$}")?;
            for v in self.row(i) {
                write!(f, " {v:6.2}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_item_is_rejected() {
        let err = DataMatrix::new(
            names(&["Rupa", "Rupa"]),
            names(&["HAND"]),
            vec![vec![Some(1)], vec![Some(2)]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateItem { name } if name == "Rupa"));
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let m = DataMatrix::new(
            names(&["A", "B"]),
            names(&["HAND", "ASH", "BIG"]),
            vec![vec![Some(1)], vec![Some(1), Some(2), Some(3)]],
        )
        .unwrap();
        assert_eq!(m.row(0), &[Some(1), None, None]);
        assert_eq!(m.observed(0), 1);
        assert!((m.missing_ratio() - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn reindex_keeps_pairs_together() {
        let s = SimilarityMatrix::from_rows(
            names(&["a", "b", "c"]),
            &[
                vec![100.0, 10.0, 20.0],
                vec![10.0, 100.0, 30.0],
                vec![20.0, 30.0, 100.0],
            ],
        );
        let r = s.reindexed(&[2, 0]);
        assert_eq!(r.labels(), &["c".to_string(), "a".to_string()]);
        assert_eq!(r.get(0, 1), 20.0);
        assert_eq!(r.get(1, 1), 100.0);
        assert!(r.is_symmetric());
    }
}
