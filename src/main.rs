use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use vulnclust_lib::dataset::Dataset;
use vulnclust_lib::labeling::{LabelMode, LabelerConfig};
use vulnclust_lib::pipeline::{run_cluster, run_info, run_label, run_prepare, ClusterOptions};
use vulnclust_lib::utils::env::load_env;
use vulnclust_lib::utils::pipeline_config::PipelineConfig;
use vulnclust_lib::utils::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about = "Cluster and label vulnerability descriptions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a raw corpus export into `{dataset}_prepared.csv`
    Prepare {
        #[arg(value_enum)]
        dataset: Dataset,
    },
    /// Print document and vocabulary counts for a prepared corpus
    Info {
        #[arg(value_enum)]
        dataset: Dataset,
    },
    /// Vectorize a prepared corpus, pick K and write the cluster assignment
    Cluster {
        #[arg(value_enum)]
        dataset: Dataset,
        /// word2vec model (`.bin` binary, anything else text)
        model_path: PathBuf,
        #[arg(long)]
        lemmatize: bool,
        /// Lemmatize on a single thread
        #[arg(long)]
        sequential: bool,
        #[arg(long, default_value = "results")]
        results_prefix: String,
        /// Overrides CLUSTER_K_MIN
        #[arg(long)]
        k_min: Option<usize>,
        /// Overrides CLUSTER_K_MAX
        #[arg(long)]
        k_max: Option<usize>,
        /// Also write a scipy-style linkage matrix
        #[arg(long)]
        write_linkage: bool,
    },
    /// Print topic words and frequent bigrams for a cluster assignment file
    Label {
        clusters: PathBuf,
        /// Keep at most N topic words per cluster
        #[arg(long)]
        num_words: Option<usize>,
        /// Drop domain-generic words and use the one-third threshold
        #[arg(long)]
        filtered: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();
    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();

    match cli.command {
        Command::Prepare { dataset } => {
            config.log_config();
            run_prepare(&config, dataset)
                .with_context(|| format!("Failed to prepare {} dataset", dataset))?;
        }
        Command::Info { dataset } => {
            run_info(&config, dataset)
                .with_context(|| format!("Failed to summarize {} dataset", dataset))?;
        }
        Command::Cluster {
            dataset,
            model_path,
            lemmatize,
            sequential,
            results_prefix,
            k_min,
            k_max,
            write_linkage,
        } => {
            if let Some(k) = k_min {
                config.k_min = k;
            }
            if let Some(k) = k_max {
                config.k_max = k;
            }
            config.log_config();

            let progress_config = ProgressConfig::from_env();
            info!(
                "Progress tracking: enabled={}, detailed={}",
                progress_config.enabled, progress_config.detailed
            );

            let options = ClusterOptions {
                dataset,
                model_path,
                lemmatize,
                sequential,
                results_prefix,
                range: config.candidate_range()?,
                write_linkage,
            };
            let stats = run_cluster(&config, &progress_config, &options)
                .await
                .context("Clustering pipeline failed")?;
            info!(
                "Clustered {} documents into {} clusters",
                stats.total_documents, stats.optimal_k
            );
        }
        Command::Label {
            clusters,
            num_words,
            filtered,
        } => {
            let mode = if filtered {
                LabelMode::Filtered
            } else {
                LabelMode::Standard
            };
            let labeler_config = LabelerConfig {
                max_topic_words: num_words,
                top_bigrams: config.top_bigrams,
                ..LabelerConfig::for_mode(mode)
            };
            run_label(&clusters, labeler_config)
                .with_context(|| format!("Failed to label {}", clusters.display()))?;
        }
    }

    info!("Done.");
    Ok(())
}
