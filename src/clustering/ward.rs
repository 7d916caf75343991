// src/clustering/ward.rs
//! Ward-linkage agglomerative clustering over Euclidean distances.
//!
//! The full merge tree is built once with `kodama` and can then be cut at any cluster count.
//! Cluster ids follow the scipy convention: leaves are `0..n` and step `i` creates `n + i`.

use anyhow::{ensure, Result};
use kodama::Method;
use log::{debug, info};
use ndarray::ArrayView2;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

#[derive(Debug, Clone)]
pub struct Dendrogram {
    leaves: usize,
    /// Ordered by non-decreasing distance
    merges: Vec<Merge>,
}

/// Condensed upper-triangle Euclidean distances between the rows of `data`.
fn condensed_distances(data: ArrayView2<f64>) -> Vec<f64> {
    let n = data.nrows();
    let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        let a = data.row(i);
        for j in (i + 1)..n {
            let diff = &a - &data.row(j);
            values.push(diff.dot(&diff).sqrt());
        }
    }
    values
}

/// Builds the complete Ward merge tree for the rows of `data`.
pub fn ward_linkage(data: ArrayView2<f64>) -> Result<Dendrogram> {
    let n = data.nrows();
    ensure!(n > 0, "Cannot cluster an empty set of vectors");
    if n == 1 {
        return Ok(Dendrogram {
            leaves: 1,
            merges: Vec::new(),
        });
    }
    let start = Instant::now();

    let mut distances = condensed_distances(data);
    let tree = kodama::linkage(&mut distances, n, Method::Ward);
    let merges: Vec<Merge> = tree
        .steps()
        .iter()
        .map(|step| Merge {
            left: step.cluster1.min(step.cluster2),
            right: step.cluster1.max(step.cluster2),
            distance: step.dissimilarity,
            size: step.size,
        })
        .collect();
    ensure!(
        merges.len() == n - 1,
        "Ward linkage over {} vectors produced {} merges",
        n,
        merges.len()
    );

    info!(
        "🌳 Built Ward merge tree over {} vectors in {:.2?}",
        n,
        start.elapsed()
    );
    Ok(Dendrogram { leaves: n, merges })
}

impl Dendrogram {
    /// Flat clustering with exactly `k` clusters. Labels are `0..k`, numbered in order of
    /// first appearance over the leaves.
    pub fn cut(&self, k: usize) -> Result<Vec<usize>> {
        ensure!(
            k >= 1 && k <= self.leaves,
            "Cannot cut {} vectors into {} clusters",
            self.leaves,
            k
        );
        let applied = self.leaves - k;
        let mut parent: Vec<Option<usize>> = vec![None; self.leaves + applied];
        for (i, merge) in self.merges[..applied].iter().enumerate() {
            parent[merge.left] = Some(self.leaves + i);
            parent[merge.right] = Some(self.leaves + i);
        }

        let mut labels_by_root: HashMap<usize, usize> = HashMap::with_capacity(k);
        let assignment = (0..self.leaves)
            .map(|leaf| {
                let mut root = leaf;
                while let Some(up) = parent[root] {
                    root = up;
                }
                let next = labels_by_root.len();
                *labels_by_root.entry(root).or_insert(next)
            })
            .collect();
        debug!("Cut tree into {} clusters", labels_by_root.len());
        Ok(assignment)
    }

    /// Scipy-style linkage rows `[a, b, distance, size]` with `a < b`.
    pub fn linkage_matrix(&self) -> Vec<[f64; 4]> {
        self.merges
            .iter()
            .map(|merge| {
                [
                    merge.left as f64,
                    merge.right as f64,
                    merge.distance,
                    merge.size as f64,
                ]
            })
            .collect()
    }
}

/// Number of members per label, indexed by label.
pub fn cluster_sizes(assignment: &[usize]) -> Vec<usize> {
    let k = assignment.iter().max().map_or(0, |m| m + 1);
    let mut sizes = vec![0; k];
    for &label in assignment {
        sizes[label] += 1;
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_condensed_distances() {
        let data = array![[0.0], [1.0], [3.0], [6.0]];
        let values = condensed_distances(data.view());
        assert_eq!(values, vec![1.0, 3.0, 6.0, 2.0, 5.0, 3.0]);
    }

    #[test]
    fn test_merge_heights_follow_ward_criterion() {
        // singletons merge at their Euclidean distance
        let data = array![[0.0, 0.0], [1.0, 0.0], [5.0, 0.0]];
        let rows = ward_linkage(data.view()).unwrap().linkage_matrix();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][..2], [0.0, 1.0]);
        assert!((rows[0][2] - 1.0).abs() < 1e-9);
        // ((1+1)*25 + (1+1)*16 - 1*1) / 3 = 81/3 = 27
        assert!((rows[1][2] - 27f64.sqrt()).abs() < 1e-9);
        assert_eq!(rows[1][3], 3.0);
    }

    #[test]
    fn test_cut_separates_well_spaced_groups() {
        let data = array![
            [0.0, 0.0],
            [10.0, 10.0],
            [0.1, 0.0],
            [10.0, 10.2],
            [0.0, 0.2],
            [20.0, 0.0]
        ];
        let tree = ward_linkage(data.view()).unwrap();
        assert_eq!(tree.cut(3).unwrap(), vec![0, 1, 0, 1, 0, 2]);
        assert_eq!(tree.cut(1).unwrap(), vec![0; 6]);
        assert_eq!(tree.cut(6).unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert!(tree.cut(0).is_err());
        assert!(tree.cut(7).is_err());
    }

    #[test]
    fn test_cut_labels_are_contiguous() {
        let data = array![[0.0], [4.0], [1.0], [9.0], [4.5], [0.5], [8.0], [3.0]];
        let tree = ward_linkage(data.view()).unwrap();
        for k in 1..=8 {
            let assignment = tree.cut(k).unwrap();
            let sizes = cluster_sizes(&assignment);
            assert_eq!(sizes.len(), k);
            assert!(sizes.iter().all(|s| *s > 0));
            assert_eq!(sizes.iter().sum::<usize>(), 8);
            assert_eq!(assignment[0], 0);
        }
    }

    #[test]
    fn test_linkage_matrix_ids() {
        let data = array![[0.0], [1.0], [10.0], [12.0]];
        let rows = ward_linkage(data.view()).unwrap().linkage_matrix();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][..2], [0.0, 1.0]);
        assert_eq!(rows[1][..2], [2.0, 3.0]);
        assert_eq!(rows[2][..2], [4.0, 5.0]);
        assert_eq!(rows[2][3], 4.0);
        assert!(rows.windows(2).all(|w| w[0][2] <= w[1][2]));
    }

    #[test]
    fn test_single_vector() {
        let data = array![[1.0, 2.0]];
        let tree = ward_linkage(data.view()).unwrap();
        assert!(tree.linkage_matrix().is_empty());
        assert_eq!(tree.cut(1).unwrap(), vec![0]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let data = ndarray::Array2::<f64>::zeros((0, 3));
        assert!(ward_linkage(data.view()).is_err());
    }
}
