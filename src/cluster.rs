//! Hierarchical clustering of a similarity matrix.
//!
//! The merging itself is done by `kodama` (average linkage, i.e. UPGMA);
//! this module prepares its input and turns its output into the tree
//! layout the renderer draws.

use std::fmt;

use kodama::{linkage, Method};
use serde::Serialize;

use crate::data::model::SimilarityMatrix;
use crate::similarity::IDENTITY;

/// One merge of the tree. Observations are numbered `0..n`; the cluster
/// created by step `k` is numbered `n + k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkageStep {
    pub left: usize,
    pub right: usize,
    /// Average dissimilarity (100 − similarity) between the two clusters.
    pub distance: f64,
    /// Number of observations in the merged cluster.
    pub size: usize,
}

/// Average-linkage tree over the items of a similarity matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Linkage {
    pub labels: Vec<String>,
    pub steps: Vec<LinkageStep>,
}

/// Upper triangle of `100 − similarity`, row by row, diagonal excluded.
pub fn condensed_dissimilarity(similarity: &SimilarityMatrix) -> Vec<f64> {
    let n = similarity.len();
    let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            condensed.push(IDENTITY - similarity.get(i, j));
        }
    }
    condensed
}

/// Cluster the items with average linkage on the unrounded similarities.
pub fn average_linkage(similarity: &SimilarityMatrix) -> Linkage {
    let n = similarity.len();
    let mut condensed = condensed_dissimilarity(similarity);
    let dendrogram = linkage(&mut condensed, n, Method::Average);

    let steps = dendrogram
        .steps()
        .iter()
        .map(|s| LinkageStep {
            left: s.cluster1.min(s.cluster2),
            right: s.cluster1.max(s.cluster2),
            distance: s.dissimilarity,
            size: s.size,
        })
        .collect();

    Linkage {
        labels: similarity.labels().to_vec(),
        steps,
    }
}

impl Linkage {
    /// Number of clustered observations.
    pub fn observations(&self) -> usize {
        self.labels.len()
    }

    /// Id of the whole-tree cluster.
    fn root(&self) -> usize {
        self.observations() + self.steps.len() - 1
    }

    /// Children of a merged cluster id.
    fn children(&self, node: usize) -> Option<(usize, usize)> {
        node.checked_sub(self.observations())
            .and_then(|k| self.steps.get(k))
            .map(|s| (s.left, s.right))
    }

    /// Observations in dendrogram order: depth first from the root, the
    /// lower-numbered child of each merge first.
    pub fn leaf_order(&self) -> Vec<usize> {
        if self.steps.is_empty() {
            return (0..self.observations()).collect();
        }
        let mut order = Vec::with_capacity(self.observations());
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => order.push(node),
            }
        }
        order
    }

    /// Coordinates for drawing: `(position, height)` of every cluster id.
    ///
    /// A leaf sits at `rank + 0.5` along the leaf axis with height 0; a
    /// merge sits midway between its children at its linkage distance.
    pub fn node_coordinates(&self) -> Vec<(f64, f64)> {
        let n = self.observations();
        let mut coords = vec![(0.0, 0.0); n + self.steps.len()];
        for (rank, leaf) in self.leaf_order().into_iter().enumerate() {
            coords[leaf] = (rank as f64 + 0.5, 0.0);
        }
        // Steps only reference earlier clusters, so one forward pass suffices.
        for (k, step) in self.steps.iter().enumerate() {
            let x = (coords[step.left].0 + coords[step.right].0) / 2.0;
            coords[n + k] = (x, step.distance);
        }
        coords
    }

    /// Largest merge distance, the height of the tree.
    pub fn height(&self) -> f64 {
        self.steps.iter().map(|s| s.distance).fold(0.0, f64::max)
    }
}

/// Prints the linkage matrix, one `[left, right, distance, size]` row per merge.
impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.steps {
            writeln!(
                f,
                "[{:>4}, {:>4}, {:>10.6}, {:>4}]",
                s.left, s.right, s.distance, s.size
            )?;
        }
        Ok(())
    }
}

/// Integer percentage shown in a heatmap cell. Ties round to even
/// (`32.5 → 32`, `33.5 → 34`).
pub fn display_percentage(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[Vec<f64>]) -> SimilarityMatrix {
        let labels = (0..rows.len()).map(|i| format!("L{i}")).collect();
        SimilarityMatrix::from_rows(labels, rows)
    }

    /// Two tight pairs: {0, 2} and {1, 3}.
    fn two_pairs() -> SimilarityMatrix {
        matrix(&[
            vec![100.0, 20.0, 90.0, 30.0],
            vec![20.0, 100.0, 10.0, 80.0],
            vec![90.0, 10.0, 100.0, 40.0],
            vec![30.0, 80.0, 40.0, 100.0],
        ])
    }

    #[test]
    fn condensed_is_upper_triangle_of_dissimilarity() {
        assert_eq!(
            condensed_dissimilarity(&two_pairs()),
            vec![80.0, 10.0, 70.0, 90.0, 20.0, 60.0]
        );
    }

    #[test]
    fn average_linkage_merges_closest_first() {
        let link = average_linkage(&two_pairs());
        assert_eq!(link.steps.len(), 3);

        let first = link.steps[0];
        assert_eq!((first.left, first.right, first.size), (0, 2, 2));
        assert!((first.distance - 10.0).abs() < 1e-9);

        let second = link.steps[1];
        assert_eq!((second.left, second.right, second.size), (1, 3, 2));
        assert!((second.distance - 20.0).abs() < 1e-9);

        // Mean of 80, 70, 90, 60.
        let last = link.steps[2];
        assert_eq!((last.left, last.right, last.size), (4, 5, 4));
        assert!((last.distance - 75.0).abs() < 1e-9);
        assert!((link.height() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn leaf_order_keeps_clusters_adjacent() {
        let link = average_linkage(&two_pairs());
        assert_eq!(link.leaf_order(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn merge_sits_between_children() {
        let link = average_linkage(&two_pairs());
        let coords = link.node_coordinates();
        assert_eq!(coords[0], (0.5, 0.0));
        assert_eq!(coords[2], (1.5, 0.0));
        assert_eq!(coords[4].0, 1.0);
        assert_eq!(coords[6].0, 2.0);
        assert!((coords[6].1 - 75.0).abs() < 1e-9);
    }

    #[test]
    fn linkage_prints_one_row_per_merge() {
        let text = average_linkage(&two_pairs()).to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().starts_with("[   0,    2,"));
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(display_percentage(32.5), 32);
        assert_eq!(display_percentage(33.5), 34);
        assert_eq!(display_percentage(100.0 / 3.0), 33);
        assert_eq!(display_percentage(66.7), 67);
        assert_eq!(display_percentage(99.0), 99);
    }
}
