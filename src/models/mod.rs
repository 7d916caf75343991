// src/models/mod.rs
pub mod stats_models;

use serde::{Deserialize, Serialize};

/// One prepared-corpus record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl Document {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// One row of a cluster-assignment artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Cluster Number")]
    pub cluster: usize,
    #[serde(rename = "Description")]
    pub description: String,
}

impl AssignmentRecord {
    pub fn new(document: &Document, cluster: usize) -> Self {
        Self {
            id: document.id.clone(),
            cluster,
            description: document.description.clone(),
        }
    }
}
