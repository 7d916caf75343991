// src/clustering/select.rs
//! Cluster-count selection followed by the final Ward clustering.
//!
//! Every candidate `i` of the scan is a cut of one Ward tree built over the scaled vectors.
//! Whenever a cut contains a singleton cluster, `i - 1` becomes a ceiling for the chosen count,
//! and the lowest ceiling seen anywhere in the scan wins. Without any singleton the count stays
//! at the number of documents.

use anyhow::{ensure, Result};
use indicatif::ProgressBar;
use log::{info, warn};
use ndarray::Array2;
use std::collections::BTreeMap;

use super::scaling::{min_max_scale, FEATURE_RANGE};
use super::ward::{cluster_sizes, ward_linkage, Dendrogram};

/// Inclusive, ascending range of candidate cluster counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRange {
    start: usize,
    end: usize,
}

impl Default for CandidateRange {
    fn default() -> Self {
        Self { start: 3, end: 27 }
    }
}

impl CandidateRange {
    pub fn new(start: usize, end: usize) -> Result<Self> {
        ensure!(start >= 2, "Candidate cluster counts must start at 2 or more, got {}", start);
        ensure!(start <= end, "Empty candidate range {}..={}", start, end);
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

/// Cluster sizes observed for one candidate count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSummary {
    pub k: usize,
    pub sizes: Vec<usize>,
}

impl TrialSummary {
    pub fn has_singleton(&self) -> bool {
        self.sizes.contains(&1)
    }

    /// How many clusters have each size.
    pub fn size_tally(&self) -> BTreeMap<usize, usize> {
        let mut tally = BTreeMap::new();
        for size in &self.sizes {
            *tally.entry(*size).or_insert(0) += 1;
        }
        tally
    }
}

#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub k: usize,
    /// `assignment[i]` is the label of document `i`; labels are `0..k`.
    pub assignment: Vec<usize>,
    pub trials: Vec<TrialSummary>,
    pub dendrogram: Dendrogram,
}

impl SelectionOutcome {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        cluster_sizes(&self.assignment)
    }
}

/// Scales `vectors` to `[-1, 1]` per column, scans `range` for the cluster count and returns the
/// final clustering at that count.
pub fn select_and_cluster(
    vectors: &Array2<f64>,
    range: CandidateRange,
    progress: Option<&ProgressBar>,
) -> Result<SelectionOutcome> {
    let n = vectors.nrows();
    ensure!(n > 0, "No document vectors to cluster");
    ensure!(
        n >= range.start(),
        "{} documents is fewer than the smallest candidate cluster count {}",
        n,
        range.start()
    );
    let end = if range.end() > n {
        warn!(
            "Candidate counts above {} exceed the number of documents and are skipped",
            n
        );
        n
    } else {
        range.end()
    };

    info!("📏 Scaling {} vectors to {:?}", n, FEATURE_RANGE);
    let scaled = min_max_scale(vectors, FEATURE_RANGE)?;
    let dendrogram = ward_linkage(scaled.view())?;

    info!(
        "🔎 Computing optimal number of clusters over {}..={}",
        range.start(),
        end
    );
    let mut optimal_k = n;
    let mut trials = Vec::with_capacity(end + 1 - range.start());
    for i in range.start()..=end {
        let trial = TrialSummary {
            k: i,
            sizes: cluster_sizes(&dendrogram.cut(i)?),
        };
        if trial.has_singleton() {
            optimal_k = optimal_k.min(i - 1);
        }
        info!(
            "  K={:>3}: cluster sizes {:?} (size: count {:?})",
            i,
            trial.sizes,
            trial.size_tally()
        );
        trials.push(trial);
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
    info!("🎯 Optimal K: {}", optimal_k);

    let assignment = dendrogram.cut(optimal_k)?;
    Ok(SelectionOutcome {
        k: optimal_k,
        assignment,
        trials,
        dendrogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_candidate_range_validation() {
        assert!(CandidateRange::new(1, 5).is_err());
        assert!(CandidateRange::new(6, 5).is_err());
        let range = CandidateRange::new(2, 2).unwrap();
        assert_eq!((range.start(), range.end()), (2, 2));
        assert_eq!(CandidateRange::default(), CandidateRange::new(3, 27).unwrap());
    }

    #[test]
    fn test_outlier_forces_smaller_k() {
        let vectors = array![[0.0, 0.0], [0.0, 0.01], [10.0, 10.0]];
        let outcome =
            select_and_cluster(&vectors, CandidateRange::new(3, 3).unwrap(), None).unwrap();
        assert!(outcome.trials[0].has_singleton());
        assert_eq!(outcome.k, 2);
        assert_eq!(outcome.assignment, vec![0, 0, 1]);
    }

    #[test]
    fn test_running_minimum_keeps_first_ceiling() {
        // the outlier is already a singleton at i = 2, which caps K at 1
        let vectors = array![[0.0, 0.0], [0.0, 0.01], [10.0, 10.0]];
        let outcome =
            select_and_cluster(&vectors, CandidateRange::new(2, 3).unwrap(), None).unwrap();
        assert_eq!(outcome.k, 1);
        assert_eq!(outcome.assignment, vec![0, 0, 0]);
    }

    #[test]
    fn test_no_singletons_keeps_document_count() {
        // two tight pairs never produce a singleton at K = 2
        let vectors = array![[0.0], [0.1], [5.0], [5.1]];
        let outcome =
            select_and_cluster(&vectors, CandidateRange::new(2, 2).unwrap(), None).unwrap();
        assert!(!outcome.trials[0].has_singleton());
        assert_eq!(outcome.k, 4);
        assert_eq!(outcome.cluster_sizes(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_k_never_exceeds_first_singleton_ceiling() {
        let vectors = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [5.0, 5.0],
            [5.2, 5.1],
            [5.1, 4.9],
            [9.0, 0.0],
            [9.1, 0.2],
            [30.0, 30.0],
            [0.3, 0.2]
        ];
        let outcome =
            select_and_cluster(&vectors, CandidateRange::new(2, 8).unwrap(), None).unwrap();
        let first_singleton = outcome
            .trials
            .iter()
            .find(|t| t.has_singleton())
            .map(|t| t.k - 1)
            .unwrap();
        assert!(outcome.k <= first_singleton);

        let sizes = outcome.cluster_sizes();
        assert_eq!(sizes.len(), outcome.k);
        assert_eq!(sizes.iter().sum::<usize>(), vectors.nrows());
        assert!(outcome.assignment.iter().all(|label| *label < outcome.k));
    }

    #[test]
    fn test_range_is_clamped_to_document_count() {
        let vectors = array![[0.0], [1.0], [2.0], [3.0]];
        let outcome =
            select_and_cluster(&vectors, CandidateRange::new(3, 27).unwrap(), None).unwrap();
        assert_eq!(outcome.trials.len(), 2);
        assert_eq!(outcome.trials.last().map(|t| t.k), Some(4));
    }

    #[test]
    fn test_too_few_documents_is_an_error() {
        let vectors = array![[0.0], [1.0]];
        assert!(select_and_cluster(&vectors, CandidateRange::default(), None).is_err());
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(select_and_cluster(&empty, CandidateRange::new(2, 3).unwrap(), None).is_err());
    }
}
