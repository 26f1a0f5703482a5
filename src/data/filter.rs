use super::model::SimilarityMatrix;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Item subsets of a similarity matrix
// ---------------------------------------------------------------------------

/// Fewest items a clustered plot can be made from.
pub const MIN_ITEMS: usize = 2;

impl SimilarityMatrix {
    /// Keep the first `n` items (rows and columns), e.g. one subgroup listed
    /// at the top of the spreadsheet.
    pub fn leading(&self, n: usize) -> Result<SimilarityMatrix> {
        if n < MIN_ITEMS || n > self.len() {
            return Err(Error::SubsetOutOfRange {
                requested: n,
                available: self.len(),
            });
        }
        let indices: Vec<usize> = (0..n).collect();
        Ok(self.reindexed(&indices))
    }

    /// Keep the named items, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<SimilarityMatrix> {
        if names.len() < MIN_ITEMS {
            return Err(Error::SubsetOutOfRange {
                requested: names.len(),
                available: self.len(),
            });
        }
        let indices = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.index_of(name)
                    .ok_or_else(|| Error::UnknownItem(name.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(self.reindexed(&indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(
            ["Duhumbi", "Khispi", "Rupa"].iter().map(|s| s.to_string()).collect(),
            &[
                vec![100.0, 90.0, 40.0],
                vec![90.0, 100.0, 45.0],
                vec![40.0, 45.0, 100.0],
            ],
        )
    }

    #[test]
    fn leading_keeps_top_left_block() {
        let s = sample().leading(2).unwrap();
        assert_eq!(s.labels(), &["Duhumbi", "Khispi"]);
        assert_eq!(s.row(0), &[100.0, 90.0]);
        assert_eq!(s.row(1), &[90.0, 100.0]);
    }

    #[test]
    fn leading_out_of_range() {
        assert!(matches!(
            sample().leading(4),
            Err(Error::SubsetOutOfRange { requested: 4, available: 3 })
        ));
        assert!(sample().leading(1).is_err());
    }

    #[test]
    fn select_by_name() {
        let s = sample().select(&["Rupa", "Duhumbi"]).unwrap();
        assert_eq!(s.labels(), &["Rupa", "Duhumbi"]);
        assert_eq!(s.get(0, 1), 40.0);
    }

    #[test]
    fn select_unknown_name() {
        let err = sample().select(&["Rupa", "Bugun"]).unwrap_err();
        assert!(matches!(err, Error::UnknownItem(name) if name == "Bugun"));
    }
}
