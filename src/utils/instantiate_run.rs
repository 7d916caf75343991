use crate::models::stats_models::RunStats;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub fn create_initial_pipeline_run(
    run_id: &str,
    run_timestamp: NaiveDateTime,
    description: Option<&str>,
    dataset: &str,
    model: &str,
    lemmatized: bool,
) -> RunStats {
    info!("Created initial run record with ID: {}", run_id);

    RunStats {
        run_id: run_id.to_string(),
        run_timestamp,
        description: description.map(|s| s.to_string()),
        dataset: dataset.to_string(),
        model: model.to_string(),
        lemmatized,
        total_documents: 0,
        embedding_dimension: 0,
        zero_vectors: 0,
        vocabulary_coverage: 0.0,
        distinct_lemmas: 0,
        optimal_k: 0,
        cluster_sizes: Vec::new(),
        trials: Vec::new(),
        artifacts: Vec::new(),
        loading_time: 0.0,
        lemmatization_time: 0.0,
        vectorization_time: 0.0,
        clustering_time: 0.0,
        total_processing_time: 0.0,
    }
}

/// Writes `stats` as pretty JSON to `{results_dir}/{prefix}_run_{run_id}.json`.
pub fn write_run_record(stats: &RunStats, results_dir: &Path, prefix: &str) -> Result<PathBuf> {
    fs::create_dir_all(results_dir).with_context(|| {
        format!("Failed to create results directory {}", results_dir.display())
    })?;
    let path = results_dir.join(format!("{}_run_{}.json", prefix, stats.run_id));
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize run record")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write run record {}", path.display()))?;
    info!("Run record saved to: {}", path.display());
    Ok(path)
}
