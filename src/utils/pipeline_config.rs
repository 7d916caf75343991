// src/utils/pipeline_config.rs
//! Environment-driven settings shared by every subcommand.

use anyhow::{ensure, Result};
use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;

use crate::clustering::select::CandidateRange;

pub const DEFAULT_K_MIN: usize = 3;
pub const DEFAULT_K_MAX: usize = 27;
pub const DEFAULT_TOP_BIGRAMS: usize = 15;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    /// WordNet `dict/` directory (index.* and *.exc files) backing the lemmatizer lexicon
    pub wordnet_dir: Option<PathBuf>,
    /// Optional `word<TAB>TAG` overrides for the part-of-speech tagger
    pub tagger_lexicon: Option<PathBuf>,
    pub lemmatizer_workers: usize,
    pub k_min: usize,
    pub k_max: usize,
    pub top_bigrams: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            wordnet_dir: None,
            tagger_lexicon: None,
            lemmatizer_workers: num_cpus::get(),
            k_min: DEFAULT_K_MIN,
            k_max: DEFAULT_K_MAX,
            top_bigrams: DEFAULT_TOP_BIGRAMS,
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            results_dir: env::var("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            wordnet_dir: env::var("WORDNET_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            tagger_lexicon: env::var("TAGGER_LEXICON")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            lemmatizer_workers: env::var("LEMMATIZER_WORKERS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.lemmatizer_workers),
            k_min: env::var("CLUSTER_K_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.k_min),
            k_max: env::var("CLUSTER_K_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.k_max),
            top_bigrams: env::var("LABEL_TOP_BIGRAMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.top_bigrams),
        };

        debug!("Pipeline config from env: {:?}", config);
        config
    }

    pub fn candidate_range(&self) -> Result<CandidateRange> {
        ensure!(
            self.k_min <= self.k_max,
            "CLUSTER_K_MIN ({}) must not exceed CLUSTER_K_MAX ({})",
            self.k_min,
            self.k_max
        );
        CandidateRange::new(self.k_min, self.k_max)
    }

    pub fn prepared_path(&self, dataset: &str) -> PathBuf {
        self.data_dir.join(format!("{}_prepared.csv", dataset))
    }

    pub fn raw_path(&self, dataset: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", dataset))
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("📁 Data directory: {}", self.data_dir.display());
        info!("📁 Results directory: {}", self.results_dir.display());
        match &self.wordnet_dir {
            Some(dir) => info!("📚 WordNet lexicon: {}", dir.display()),
            None => warn!("📚 No WORDNET_DIR set - lemmatizer falls back to exception-only mode"),
        }
        if let Some(path) = &self.tagger_lexicon {
            info!("🏷️  Tagger lexicon overrides: {}", path.display());
        }
        info!("⚙️  Lemmatizer workers: {}", self.lemmatizer_workers);
        info!("🔢 Candidate cluster counts: {}..={}", self.k_min, self.k_max);
    }
}
