// src/clustering/mod.rs
pub mod scaling;
pub mod select;
pub mod ward;

pub use select::{select_and_cluster, CandidateRange, SelectionOutcome, TrialSummary};
pub use ward::{cluster_sizes, ward_linkage, Dendrogram};
