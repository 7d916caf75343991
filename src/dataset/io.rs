// src/dataset/io.rs
//! Delimited-text artifacts: prepared corpora, cluster assignments, document vectors and
//! linkage matrices.

use anyhow::{Context, Result};
use log::info;
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{AssignmentRecord, Document};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: T = result
            .with_context(|| format!("Malformed record {} in {}", row + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write record to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Reads an `ID,Description` corpus; the header row is required and skipped.
pub fn read_prepared(path: &Path) -> Result<Vec<Document>> {
    let documents = read_records(path)?;
    info!("Loaded {} documents from: {}", documents.len(), path.display());
    Ok(documents)
}

pub fn write_prepared(path: &Path, documents: &[Document]) -> Result<()> {
    write_records(path, documents)
}

/// Reads an `ID,Cluster Number,Description` artifact.
pub fn read_assignments(path: &Path) -> Result<Vec<AssignmentRecord>> {
    read_records(path)
}

pub fn write_assignments(path: &Path, records: &[AssignmentRecord]) -> Result<()> {
    write_records(path, records)?;
    info!("Document Clusters saved to: {}", path.display());
    Ok(())
}

/// One comma-separated row per document; no header and no ID column.
pub fn write_vectors(path: &Path, vectors: &Array2<f64>) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in vectors.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("Failed to write vector row to {}", path.display()))?;
    }
    writer.flush()?;
    info!("Document Vectors saved to: {}", path.display());
    Ok(())
}

/// Scipy-compatible linkage rows, no header.
pub fn write_linkage(path: &Path, rows: &[[f64; 4]]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    info!("Linkage matrix saved to: {}", path.display());
    Ok(())
}

/// Model tag used in artifact names: the file stem without its first `_`-separated segment
/// (`w2v_cve_100.bin` -> `cve_100`).
pub fn model_tag(model_path: &Path) -> String {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => stem,
    }
}

/// File names of the artifacts produced by one clustering run.
#[derive(Debug, Clone)]
pub struct ArtifactNames {
    results_dir: PathBuf,
    prefix: String,
    model: String,
    dataset: String,
}

impl ArtifactNames {
    pub fn new(results_dir: &Path, prefix: &str, model: &str, dataset: &str) -> Self {
        Self {
            results_dir: results_dir.to_path_buf(),
            prefix: prefix.to_string(),
            model: model.to_string(),
            dataset: dataset.to_string(),
        }
    }

    pub fn vectors(&self) -> PathBuf {
        self.results_dir.join(format!(
            "{}_docVectors_{}_{}.csv",
            self.prefix, self.model, self.dataset
        ))
    }

    pub fn clusters(&self, k: usize) -> PathBuf {
        self.results_dir.join(format!(
            "{}_docClusters_{}_{}_K_{}.csv",
            self.prefix, self.model, self.dataset, k
        ))
    }

    pub fn linkage(&self) -> PathBuf {
        self.results_dir.join(format!(
            "{}_linkage_{}_{}.csv",
            self.prefix, self.model, self.dataset
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_assignments_round_trip_with_quoted_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("clusters.csv");
        let records = vec![
            AssignmentRecord {
                id: "CVE-2019-0001".to_string(),
                cluster: 0,
                description: "overflow, in parser \"quoted\"".to_string(),
            },
            AssignmentRecord {
                id: "CVE-2019-0002".to_string(),
                cluster: 1,
                description: "".to_string(),
            },
        ];
        write_assignments(&path, &records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ID,Cluster Number,Description\n"));
        assert_eq!(read_assignments(&path).unwrap(), records);
    }

    #[test]
    fn test_prepared_corpus_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cve_prepared.csv");
        let documents = vec![
            Document::new("CVE-1", "heap overflow VERVER"),
            Document::new("CVE-2", "sql injection, login"),
        ];
        write_prepared(&path, &documents).unwrap();
        assert_eq!(read_prepared(&path).unwrap(), documents);
    }

    #[test]
    fn test_missing_description_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "ID,Description\nCVE-1,ok\nCVE-2\n").unwrap();
        assert!(read_prepared(&path).is_err());
    }

    #[test]
    fn test_vectors_have_no_header_and_keep_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.csv");
        let vectors = array![[0.5, -1.0, 0.0], [2.25, 0.0, 1.0]];
        write_vectors(&path, &vectors).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0.5,-1,0\n2.25,0,1\n");
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(model_tag(Path::new("/models/w2v_cve_100.bin")), "cve_100");
        assert_eq!(model_tag(Path::new("model.txt")), "model");
        let names = ArtifactNames::new(Path::new("results"), "exp1", "cve_100", "cve");
        assert_eq!(
            names.vectors(),
            PathBuf::from("results/exp1_docVectors_cve_100_cve.csv")
        );
        assert_eq!(
            names.clusters(12),
            PathBuf::from("results/exp1_docClusters_cve_100_cve_K_12.csv")
        );
        assert_eq!(
            names.linkage(),
            PathBuf::from("results/exp1_linkage_cve_100_cve.csv")
        );
    }
}
