// src/pipeline/cluster_run.rs
//! The `cluster` command: load, (lemmatize,) vectorize, select K, cluster, persist.

use anyhow::{anyhow, ensure, Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::clustering::{select_and_cluster, CandidateRange};
use crate::dataset::io::{
    model_tag, read_prepared, write_assignments, write_linkage, write_vectors, ArtifactNames,
};
use crate::dataset::Dataset;
use crate::embedding::vectorize::vectorize_corpus;
use crate::embedding::word2vec::load_model;
use crate::embedding::EmbeddingLookup;
use crate::models::stats_models::{RunStats, TrialStats};
use crate::models::AssignmentRecord;
use crate::text::{
    word_tokenize, Lexicon, ParallelLemmatizer, SuffixTagger, TokenSequence, WordNetLemmatizer,
};
use crate::utils::get_memory_usage;
use crate::utils::instantiate_run::{create_initial_pipeline_run, write_run_record};
use crate::utils::pipeline_config::PipelineConfig;
use crate::utils::progress_config::{phase_bar, ProgressConfig};

const TOTAL_PHASES: u64 = 4;

#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub dataset: Dataset,
    pub model_path: PathBuf,
    pub lemmatize: bool,
    /// Use the single-threaded lemmatizer
    pub sequential: bool,
    pub results_prefix: String,
    pub range: CandidateRange,
    pub write_linkage: bool,
}

fn update_main_pb_message(pb: &ProgressBar, phase: &str, step: u64, config: &ProgressConfig) {
    if config.should_show_memory() {
        pb.set_message(format!(
            "{}: {} (Memory: {} MB)",
            phase,
            step,
            get_memory_usage()
        ));
    } else {
        pb.set_message(format!("{}: {}", phase, step));
    }
}

fn build_lemmatizer(config: &PipelineConfig) -> Result<ParallelLemmatizer> {
    let mut tagger = SuffixTagger::new();
    if let Some(path) = &config.tagger_lexicon {
        tagger = tagger.with_lexicon(SuffixTagger::load_lexicon(path)?);
    }
    let dir = config.wordnet_dir.as_ref().ok_or_else(|| {
        anyhow!("Lemmatization requires WORDNET_DIR to point at a WordNet dict directory")
    })?;
    let lexicon = Lexicon::load_wordnet_dir(dir)
        .with_context(|| format!("Failed to load WordNet lexicon from {}", dir.display()))?;
    Ok(ParallelLemmatizer::new(
        Arc::new(tagger),
        WordNetLemmatizer::new(lexicon),
        config.lemmatizer_workers,
    ))
}

pub async fn run_cluster(
    config: &PipelineConfig,
    progress_config: &ProgressConfig,
    options: &ClusterOptions,
) -> Result<RunStats> {
    let pipeline_start = Instant::now();
    let multi_progress = progress_config.create_multi_progress();
    let main_pb = multi_progress.as_ref().map(|mp| {
        let pb = mp.add(ProgressBar::new(TOTAL_PHASES));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Initializing pipeline...");
        pb
    });
    let detailed = if progress_config.should_show_detailed() {
        multi_progress.clone()
    } else {
        None
    };

    info!("Instantiating variables for run");
    let mut phase_times: HashMap<&str, Duration> = HashMap::new();
    let run_id = Uuid::new_v4().to_string();
    let model = model_tag(&options.model_path);
    let description = format!(
        "Ward clustering of {} with model {}{}",
        options.dataset,
        model,
        if options.lemmatize { " (lemmatized)" } else { "" }
    );
    let mut stats = create_initial_pipeline_run(
        &run_id,
        Utc::now().naive_utc(),
        Some(&description),
        options.dataset.as_str(),
        &model,
        options.lemmatize,
    );
    let names = ArtifactNames::new(
        &config.results_dir,
        &options.results_prefix,
        &model,
        options.dataset.as_str(),
    );

    // Phase 1: load and tokenize the prepared corpus
    if let Some(pb) = &main_pb {
        update_main_pb_message(pb, "Phase 1: Loading documents", 0, progress_config);
    }
    let phase1_start = Instant::now();
    let data_path = config.prepared_path(options.dataset.as_str());
    info!("Loading documents from: {}", data_path.display());
    let documents = read_prepared(&data_path)?;
    ensure!(
        !documents.is_empty(),
        "Prepared corpus {} has no documents",
        data_path.display()
    );
    let mut sequences: Vec<TokenSequence> = documents
        .iter()
        .map(|d| word_tokenize(&d.description))
        .collect();
    stats.total_documents = documents.len();
    let phase1_duration = phase1_start.elapsed();
    phase_times.insert("loading", phase1_duration);
    stats.loading_time = phase1_duration.as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
        update_main_pb_message(pb, "Phase 1 complete", 1, progress_config);
    }

    // Phase 2: optional lemmatization
    let phase2_start = Instant::now();
    if options.lemmatize {
        if let Some(pb) = &main_pb {
            update_main_pb_message(pb, "Phase 2: Lemmatizing", 1, progress_config);
        }
        info!("Lemmatizing documents (this might take a while)...");
        let lemmatizer = build_lemmatizer(config)?;
        let output = if options.sequential {
            let pb = phase_bar(&detailed, sequences.len() as u64, "Lemmatizing");
            lemmatizer.lemmatize_sequential(&sequences, pb)
        } else {
            lemmatizer.lemmatize(sequences).await?
        };
        info!("Lemma map holds {} lemmas", output.lemma_map.len());
        for (lemma, forms) in output.lemma_map.sorted_entries() {
            debug!("  {} <- {:?}", lemma, forms);
        }
        stats.distinct_lemmas = output.lemma_map.len();
        sequences = output.lemma_sequences;
    }
    let phase2_duration = phase2_start.elapsed();
    phase_times.insert("lemmatization", phase2_duration);
    stats.lemmatization_time = phase2_duration.as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
        update_main_pb_message(pb, "Phase 2 complete", 2, progress_config);
    }

    // Phase 3: document vectors
    if let Some(pb) = &main_pb {
        update_main_pb_message(pb, "Phase 3: Computing document vectors", 2, progress_config);
    }
    let phase3_start = Instant::now();
    info!("Loading model from: {}", options.model_path.display());
    let embeddings = load_model(&options.model_path)?;
    info!("Computing document vectors...");
    let vector_pb = phase_bar(&detailed, sequences.len() as u64, "Vectorizing");
    let (vectors, vector_stats) = vectorize_corpus(&sequences, &embeddings, vector_pb.as_ref());
    if let Some(pb) = vector_pb {
        pb.finish_with_message("Vectorization complete");
    }
    write_vectors(&names.vectors(), &vectors)?;
    stats.artifacts.push(names.vectors().display().to_string());
    stats.embedding_dimension = embeddings.dimension();
    stats.zero_vectors = vector_stats.zero_vectors;
    stats.vocabulary_coverage = vector_stats.coverage();
    let phase3_duration = phase3_start.elapsed();
    phase_times.insert("vectorization", phase3_duration);
    stats.vectorization_time = phase3_duration.as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
        update_main_pb_message(pb, "Phase 3 complete", 3, progress_config);
    }

    // Phase 4: cluster count selection and final clustering
    if let Some(pb) = &main_pb {
        update_main_pb_message(pb, "Phase 4: Clustering", 3, progress_config);
    }
    let phase4_start = Instant::now();
    let scan_len = (options.range.end().min(documents.len()) + 1)
        .saturating_sub(options.range.start()) as u64;
    let scan_pb = phase_bar(&detailed, scan_len, "Scanning K");
    let outcome = select_and_cluster(&vectors, options.range, scan_pb.as_ref())?;
    if let Some(pb) = scan_pb {
        pb.finish_with_message(format!("Optimal K: {}", outcome.k));
    }

    let records: Vec<AssignmentRecord> = documents
        .iter()
        .zip(&outcome.assignment)
        .map(|(doc, cluster)| AssignmentRecord::new(doc, *cluster))
        .collect();
    let clusters_path = names.clusters(outcome.k);
    write_assignments(&clusters_path, &records)?;
    stats.artifacts.push(clusters_path.display().to_string());
    if options.write_linkage {
        write_linkage(&names.linkage(), &outcome.dendrogram.linkage_matrix())?;
        stats.artifacts.push(names.linkage().display().to_string());
    }

    stats.optimal_k = outcome.k;
    stats.cluster_sizes = outcome.cluster_sizes();
    stats.trials = outcome
        .trials
        .iter()
        .map(|t| TrialStats {
            k: t.k,
            cluster_sizes: t.sizes.clone(),
            has_singleton: t.has_singleton(),
        })
        .collect();
    let phase4_duration = phase4_start.elapsed();
    phase_times.insert("clustering", phase4_duration);
    stats.clustering_time = phase4_duration.as_secs_f64();
    stats.total_processing_time = pipeline_start.elapsed().as_secs_f64();

    if let Some(pb) = &main_pb {
        pb.inc(1);
        update_main_pb_message(
            pb,
            &format!("Pipeline complete: {} clusters", outcome.k),
            4,
            progress_config,
        );
        pb.finish();
    }

    write_run_record(&stats, &config.results_dir, &options.results_prefix)?;

    info!("=== Pipeline Summary ===");
    info!("Run ID: {}", run_id);
    info!("Documents: {}", stats.total_documents);
    info!("Optimal K: {}", stats.optimal_k);
    info!("Cluster sizes: {:?}", stats.cluster_sizes);
    info!("=== Timing Breakdown ===");
    info!("Phase 1 (Loading): {:.2?}", phase1_duration);
    info!("Phase 2 (Lemmatization): {:.2?}", phase2_duration);
    info!("Phase 3 (Vectorization): {:.2?}", phase3_duration);
    info!("Phase 4 (Clustering): {:.2?}", phase4_duration);
    info!("Total execution time: {:.2?}", pipeline_start.elapsed());
    debug!("Phase times: {:?}", phase_times);
    if progress_config.should_show_memory() {
        info!("Final memory usage: {} MB", get_memory_usage());
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::io::{read_assignments, write_prepared};
    use crate::models::Document;
    use std::io::Write;

    fn write_wordnet_dir(dir: &std::path::Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("index.noun"),
            "  1 This software and database is provided\n\
             buffer n 2 1 @ 2 0 13 14\n\
             injection n 1 0 1 0 14\n\
             login n 1 0 1 0 14\n\
             overflow n 1 0 1 0 14\n\
             packet n 1 0 1 0 14\n\
             parser n 1 0 1 0 14\n\
             search n 1 0 1 0 14\n\
             sql n 1 0 1 0 14\n\
             stack n 1 0 1 0 14\n",
        )
        .unwrap();
        std::fs::write(dir.join("index.verb"), "crash v 1 0 1 0 2\n").unwrap();
    }

    fn write_text_model(path: &std::path::Path) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "6 2").unwrap();
        writeln!(file, "sql 1.0 0.0").unwrap();
        writeln!(file, "injection 1.0 0.1").unwrap();
        writeln!(file, "buffer 0.0 1.0").unwrap();
        writeln!(file, "overflow 0.1 1.0").unwrap();
        writeln!(file, "xss -1.0 -1.0").unwrap();
        writeln!(file, "packet 0.5 0.5").unwrap();
    }

    #[tokio::test]
    async fn test_cluster_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: dir.path().join("data"),
            results_dir: dir.path().join("results"),
            wordnet_dir: Some(dir.path().join("wordnet")),
            lemmatizer_workers: 2,
            ..PipelineConfig::default()
        };
        write_wordnet_dir(&dir.path().join("wordnet"));
        let documents = vec![
            Document::new("CVE-1", "sql injection login"),
            Document::new("CVE-2", "sql injection search"),
            Document::new("CVE-3", "buffer overflow parser"),
            Document::new("CVE-4", "buffer overflow packets"),
            Document::new("CVE-5", "sql injections"),
            Document::new("CVE-6", "stack buffer overflow"),
        ];
        write_prepared(&config.prepared_path("cve"), &documents).unwrap();
        let model_path = dir.path().join("w2v_cve_2.txt");
        write_text_model(&model_path);

        let options = ClusterOptions {
            dataset: Dataset::Cve,
            model_path,
            lemmatize: true,
            sequential: false,
            results_prefix: "test".to_string(),
            range: CandidateRange::new(2, 3).unwrap(),
            write_linkage: true,
        };
        let progress = ProgressConfig {
            enabled: false,
            ..ProgressConfig::default()
        };
        let stats = run_cluster(&config, &progress, &options).await.unwrap();

        assert_eq!(stats.total_documents, 6);
        assert_eq!(stats.embedding_dimension, 2);
        // "injections" and "packets" fold into their singular lemmas
        assert_eq!(stats.distinct_lemmas, 9);
        assert_eq!(stats.trials.len(), 2);
        assert_eq!(stats.cluster_sizes.iter().sum::<usize>(), 6);
        assert_eq!(stats.artifacts.len(), 3);

        let names = ArtifactNames::new(&config.results_dir, "test", "cve_2", "cve");
        let records = read_assignments(&names.clusters(stats.optimal_k)).unwrap();
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.cluster < stats.optimal_k));
        assert_eq!(records[0].id, "CVE-1");
        assert!(names.vectors().exists());
        assert!(names.linkage().exists());
    }

    #[tokio::test]
    async fn test_lemmatizer_uses_wordnet_lexicon() {
        let dir = tempfile::tempdir().unwrap();
        write_wordnet_dir(dir.path());
        let config = PipelineConfig {
            wordnet_dir: Some(dir.path().to_path_buf()),
            lemmatizer_workers: 2,
            ..PipelineConfig::default()
        };
        let lemmatizer = build_lemmatizer(&config).unwrap();
        let tokens = vec!["injections".to_string(), "crashed".to_string(), "buffers".to_string()];
        let output = lemmatizer.lemmatize(vec![tokens]).await.unwrap();
        assert_eq!(output.lemma_sequences, vec![vec!["injection", "crash", "buffer"]]);
        assert_eq!(
            output.lemma_map.surface_forms("buffer"),
            Some(&["buffers".to_string()][..])
        );
    }

    #[test]
    fn test_lemmatizer_requires_wordnet_dir() {
        let config = PipelineConfig {
            wordnet_dir: None,
            ..PipelineConfig::default()
        };
        assert!(build_lemmatizer(&config).is_err());

        let empty = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            wordnet_dir: Some(empty.path().to_path_buf()),
            ..PipelineConfig::default()
        };
        assert!(build_lemmatizer(&config).is_err());
    }

    #[tokio::test]
    async fn test_missing_corpus_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            results_dir: dir.path().join("results"),
            ..PipelineConfig::default()
        };
        let options = ClusterOptions {
            dataset: Dataset::Vhp,
            model_path: dir.path().join("missing.bin"),
            lemmatize: false,
            sequential: false,
            results_prefix: "x".to_string(),
            range: CandidateRange::default(),
            write_linkage: false,
        };
        let progress = ProgressConfig {
            enabled: false,
            ..ProgressConfig::default()
        };
        assert!(run_cluster(&config, &progress, &options).await.is_err());
    }
}
