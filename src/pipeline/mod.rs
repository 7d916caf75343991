// src/pipeline/mod.rs
//! Entry points for the `prepare`, `info`, `cluster` and `label` commands.

pub mod cluster_run;

use anyhow::{ensure, Result};
use log::info;
use std::path::Path;

use crate::dataset::info::DatasetInfo;
use crate::dataset::io::{read_assignments, read_prepared};
use crate::dataset::prepare::{prepare_dataset, PrepareStats};
use crate::dataset::Dataset;
use crate::labeling::{print_labels, ClusterLabeler, ClusterLabels, LabelerConfig};
use crate::text::Normalizer;
use crate::utils::pipeline_config::PipelineConfig;

pub use cluster_run::{run_cluster, ClusterOptions};

pub fn run_prepare(config: &PipelineConfig, dataset: Dataset) -> Result<PrepareStats> {
    let normalizer = Normalizer::default();
    prepare_dataset(
        dataset,
        &config.raw_path(dataset.as_str()),
        &config.prepared_path(dataset.as_str()),
        &normalizer,
    )
}

pub fn run_info(config: &PipelineConfig, dataset: Dataset) -> Result<DatasetInfo> {
    let documents = read_prepared(&config.prepared_path(dataset.as_str()))?;
    let summary = DatasetInfo::from_documents(&documents);
    summary.log_summary(dataset.as_str());
    Ok(summary)
}

/// Labels a cluster-assignment artifact and prints the word and bigram lines to stdout.
pub fn run_label(clusters_path: &Path, labeler_config: LabelerConfig) -> Result<Vec<ClusterLabels>> {
    let records = read_assignments(clusters_path)?;
    ensure!(
        !records.is_empty(),
        "Cluster file {} has no records",
        clusters_path.display()
    );
    info!(
        "Labeling {} documents from: {}",
        records.len(),
        clusters_path.display()
    );
    let labels = ClusterLabeler::new(labeler_config).label(&records);
    print_labels(&labels);
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::io::{write_assignments, write_prepared};
    use crate::labeling::LabelMode;
    use crate::models::{AssignmentRecord, Document};

    #[test]
    fn test_run_info_reads_prepared_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        write_prepared(
            &config.prepared_path("vhp"),
            &[Document::new("a", "one two"), Document::new("b", "two three four")],
        )
        .unwrap();
        let summary = run_info(&config, Dataset::Vhp).unwrap();
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.total_words, 5);
        assert_eq!(summary.unique_words, 4);
    }

    #[test]
    fn test_run_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.csv");
        let records = vec![
            AssignmentRecord {
                id: "1".to_string(),
                cluster: 1,
                description: "buffer overflow".to_string(),
            },
            AssignmentRecord {
                id: "2".to_string(),
                cluster: 0,
                description: "sql injection".to_string(),
            },
            AssignmentRecord {
                id: "3".to_string(),
                cluster: 1,
                description: "buffer overflow parser".to_string(),
            },
        ];
        write_assignments(&path, &records).unwrap();

        let labels = run_label(&path, LabelerConfig::for_mode(LabelMode::Standard)).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].cluster, 1);
        assert_eq!(labels[1].documents, 2);
        assert_eq!(labels[1].bigrams[0].count, 2);
        assert!(labels[1]
            .topic_words
            .iter()
            .any(|w| w.word == "parser" && w.count == 1));
    }
}
