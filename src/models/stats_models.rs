// src/models/stats_models.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Candidate count and the cluster sizes it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStats {
    pub k: usize,
    pub cluster_sizes: Vec<usize>,
    pub has_singleton: bool,
}

/// Summary of one `cluster` run, persisted as JSON next to the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub description: Option<String>,
    pub dataset: String,
    pub model: String,
    pub lemmatized: bool,
    pub total_documents: usize,
    pub embedding_dimension: usize,
    pub zero_vectors: usize,
    pub vocabulary_coverage: f64,
    pub distinct_lemmas: usize,
    pub optimal_k: usize,
    pub cluster_sizes: Vec<usize>,
    pub trials: Vec<TrialStats>,
    pub artifacts: Vec<String>,
    pub loading_time: f64,
    pub lemmatization_time: f64,
    pub vectorization_time: f64,
    pub clustering_time: f64,
    pub total_processing_time: f64,
}
