// src/labeling/mod.rs
//! Topic words and frequent bigrams per cluster.
//!
//! Topic words count member documents, not tokens: each description contributes its distinct
//! words once. A word qualifies when it appears in at least `num/den` of the cluster's documents.
//! Bigrams are counted over the tokenized description text with no document threshold.

use anyhow::{ensure, Result};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::AssignmentRecord;
use crate::text::stopwords::Stoplist;
use crate::text::tokenize::{bigrams, word_tokenize};

/// Minimum share of a cluster's documents a topic word must appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    num: usize,
    den: usize,
}

impl Threshold {
    pub const HALF: Threshold = Threshold { num: 1, den: 2 };
    pub const THIRD: Threshold = Threshold { num: 1, den: 3 };

    pub fn new(num: usize, den: usize) -> Result<Self> {
        ensure!(den > 0, "Threshold denominator must be positive");
        ensure!(num <= den, "Threshold {}/{} exceeds one", num, den);
        Ok(Self { num, den })
    }

    /// `count >= documents * num / den`, evaluated without rounding.
    pub fn admits(&self, count: usize, documents: usize) -> bool {
        count * self.den >= documents * self.num
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// One-half threshold over every word
    Standard,
    /// One-third threshold after dropping domain-generic words
    Filtered,
}

#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub threshold: Threshold,
    pub ignore: Stoplist,
    /// Keep only the N most frequent qualifying words per cluster
    pub max_topic_words: Option<usize>,
    pub top_bigrams: usize,
}

impl LabelerConfig {
    pub fn for_mode(mode: LabelMode) -> Self {
        match mode {
            LabelMode::Standard => Self {
                threshold: Threshold::HALF,
                ignore: Stoplist::default(),
                max_topic_words: None,
                top_bigrams: 15,
            },
            LabelMode::Filtered => Self {
                threshold: Threshold::THIRD,
                ignore: Stoplist::domain_ignore(),
                max_topic_words: None,
                top_bigrams: 15,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicWord {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigramCount {
    pub first: String,
    pub second: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabels {
    pub cluster: usize,
    pub documents: usize,
    /// Ascending by document count
    pub topic_words: Vec<TopicWord>,
    /// Descending by frequency
    pub bigrams: Vec<BigramCount>,
}

pub struct ClusterLabeler {
    config: LabelerConfig,
}

impl ClusterLabeler {
    pub fn new(config: LabelerConfig) -> Self {
        Self { config }
    }

    /// Labels every cluster present in `records`, ordered by cluster number.
    pub fn label(&self, records: &[AssignmentRecord]) -> Vec<ClusterLabels> {
        let mut topic_words = self.topic_words(records);
        let mut top_bigrams = self.top_bigrams(records);
        let labels: Vec<ClusterLabels> = documents_per_cluster(records)
            .into_iter()
            .map(|(cluster, documents)| ClusterLabels {
                cluster,
                documents,
                topic_words: topic_words.remove(&cluster).unwrap_or_default(),
                bigrams: top_bigrams.remove(&cluster).unwrap_or_default(),
            })
            .collect();
        info!(
            "🏷️  Labeled {} clusters from {} documents",
            labels.len(),
            records.len()
        );
        labels
    }

    pub fn topic_words(&self, records: &[AssignmentRecord]) -> BTreeMap<usize, Vec<TopicWord>> {
        let documents = documents_per_cluster(records);
        let mut counts: BTreeMap<usize, HashMap<&str, usize>> = BTreeMap::new();
        for record in records {
            let cluster_counts = counts.entry(record.cluster).or_default();
            let distinct: HashSet<&str> = record.description.split_whitespace().collect();
            for word in distinct {
                if self.config.ignore.contains(word) {
                    continue;
                }
                *cluster_counts.entry(word).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .map(|(cluster, word_counts)| {
                let docs = documents.get(&cluster).copied().unwrap_or(0);
                let mut words: Vec<TopicWord> = word_counts
                    .into_iter()
                    .filter(|(_, count)| self.config.threshold.admits(*count, docs))
                    .map(|(word, count)| TopicWord {
                        word: word.to_string(),
                        count,
                    })
                    .collect();
                words.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.word.cmp(&b.word)));
                if let Some(max) = self.config.max_topic_words {
                    let excess = words.len().saturating_sub(max);
                    words.drain(..excess);
                }
                debug!(
                    "Cluster {}: {} documents, {} topic words",
                    cluster,
                    docs,
                    words.len()
                );
                (cluster, words)
            })
            .collect()
    }

    pub fn top_bigrams(&self, records: &[AssignmentRecord]) -> BTreeMap<usize, Vec<BigramCount>> {
        // (count, first occurrence) per bigram
        let mut frequencies: BTreeMap<usize, HashMap<(String, String), (usize, usize)>> =
            BTreeMap::new();
        for record in records {
            let cluster_freq = frequencies.entry(record.cluster).or_default();
            for pair in bigrams(&word_tokenize(&record.description)) {
                let seen = cluster_freq.len();
                cluster_freq.entry(pair).or_insert((0, seen)).0 += 1;
            }
        }

        frequencies
            .into_iter()
            .map(|(cluster, freq)| {
                let mut ranked: Vec<((String, String), (usize, usize))> = freq.into_iter().collect();
                ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.1 .1.cmp(&b.1 .1)));
                let top = ranked
                    .into_iter()
                    .take(self.config.top_bigrams)
                    .map(|((first, second), (count, _))| BigramCount {
                        first,
                        second,
                        count,
                    })
                    .collect();
                (cluster, top)
            })
            .collect()
    }
}

fn documents_per_cluster(records: &[AssignmentRecord]) -> BTreeMap<usize, usize> {
    let mut documents = BTreeMap::new();
    for record in records {
        *documents.entry(record.cluster).or_insert(0) += 1;
    }
    documents
}

/// `3: [buffer (4), overflow (5)]`
pub fn format_topic_line(labels: &ClusterLabels) -> String {
    let words: Vec<String> = labels
        .topic_words
        .iter()
        .map(|w| format!("{} ({})", w.word, w.count))
        .collect();
    format!("{}: [{}]", labels.cluster, words.join(", "))
}

/// `3: buffer overflow (4), remote attacker (2)`
pub fn format_bigram_line(labels: &ClusterLabels) -> String {
    let pairs: Vec<String> = labels
        .bigrams
        .iter()
        .map(|b| format!("{} {} ({})", b.first, b.second, b.count))
        .collect();
    format!("{}: {}", labels.cluster, pairs.join(", "))
}

pub fn print_labels(labels: &[ClusterLabels]) {
    println!("Most Frequent Words:");
    for cluster in labels {
        println!("{}", format_topic_line(cluster));
    }
    println!();
    println!("Most Frequent Bigrams:");
    for cluster in labels {
        println!("{}", format_bigram_line(cluster));
    }
}
