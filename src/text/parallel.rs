// src/text/parallel.rs
//! Corpus-wide lemmatization, fanned out over blocking worker tasks.
//!
//! Both phases split the corpus into contiguous, owned chunks (one per worker) and join the
//! chunk results in input order. In the lemmatization phase each worker builds a private
//! [`LemmaMap`]; the calling task merges the private maps chunk by chunk once every worker has
//! finished, so the merged map is identical to the one the sequential path builds.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use indicatif::ProgressBar;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::lemmatizer::WordNetLemmatizer;
use super::tagger::{PosTagger, TaggedToken};
use super::tokenize::TokenSequence;

/// Lemma to the distinct surface forms that reduced to it, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LemmaMap {
    entries: HashMap<String, Vec<String>>,
}

impl LemmaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, lemma: &str, surface: &str) {
        let forms = self.entries.entry(lemma.to_string()).or_default();
        if !forms.iter().any(|f| f == surface) {
            forms.push(surface.to_string());
        }
    }

    /// Folds `other` into `self`; forms already present keep their position.
    pub fn merge(&mut self, other: LemmaMap) {
        for (lemma, forms) in other.entries {
            let existing = self.entries.entry(lemma).or_default();
            for form in forms {
                if !existing.contains(&form) {
                    existing.push(form);
                }
            }
        }
    }

    pub fn surface_forms(&self, lemma: &str) -> Option<&[String]> {
        self.entries.get(lemma).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by lemma, for stable inspection output.
    pub fn sorted_entries(&self) -> Vec<(&String, &Vec<String>)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[derive(Debug, Clone, Default)]
pub struct LemmatizationOutput {
    pub lemma_sequences: Vec<TokenSequence>,
    pub lemma_map: LemmaMap,
}

pub struct ParallelLemmatizer {
    tagger: Arc<dyn PosTagger>,
    lemmatizer: Arc<WordNetLemmatizer>,
    workers: usize,
}

impl ParallelLemmatizer {
    pub fn new(tagger: Arc<dyn PosTagger>, lemmatizer: WordNetLemmatizer, workers: usize) -> Self {
        Self {
            tagger,
            lemmatizer: Arc::new(lemmatizer),
            workers: workers.max(1),
        }
    }

    /// Tags then lemmatizes every sequence. Output `i` belongs to input `i`.
    ///
    /// A panicking worker fails the whole call; no partial output is returned.
    pub async fn lemmatize(&self, sequences: Vec<TokenSequence>) -> Result<LemmatizationOutput> {
        if sequences.is_empty() {
            return Ok(LemmatizationOutput::default());
        }
        let total = sequences.len();
        let start = Instant::now();

        info!(
            "🔤 Tagging {} token sequences across {} workers...",
            total, self.workers
        );
        let tagging_tasks = partition(sequences, self.workers)
            .into_iter()
            .map(|chunk| {
                let tagger = Arc::clone(&self.tagger);
                tokio::task::spawn_blocking(move || {
                    chunk
                        .iter()
                        .map(|sequence| tagger.tag(sequence))
                        .collect::<Vec<Vec<TaggedToken>>>()
                })
            })
            .collect::<Vec<_>>();
        let tagged: Vec<Vec<TaggedToken>> = try_join_all(tagging_tasks)
            .await
            .context("Part-of-speech tagging worker failed")?
            .into_iter()
            .flatten()
            .collect();
        debug!("Tagging finished in {:.2?}", start.elapsed());

        let lemma_tasks = partition(tagged, self.workers)
            .into_iter()
            .map(|chunk| {
                let lemmatizer = Arc::clone(&self.lemmatizer);
                tokio::task::spawn_blocking(move || lemmatize_chunk(&lemmatizer, &chunk, None))
            })
            .collect::<Vec<_>>();
        let chunk_results = try_join_all(lemma_tasks)
            .await
            .context("Lemmatization worker failed")?;

        let mut output = LemmatizationOutput {
            lemma_sequences: Vec::with_capacity(total),
            lemma_map: LemmaMap::new(),
        };
        for (sequences, map) in chunk_results {
            output.lemma_sequences.extend(sequences);
            output.lemma_map.merge(map);
        }

        info!(
            "✅ Lemmatized {} sequences in {:.2?} ({} distinct lemmas)",
            total,
            start.elapsed(),
            output.lemma_map.len()
        );
        Ok(output)
    }

    /// Single-threaded variant with the same output, reporting progress per sequence.
    pub fn lemmatize_sequential(
        &self,
        sequences: &[TokenSequence],
        progress: Option<ProgressBar>,
    ) -> LemmatizationOutput {
        let start = Instant::now();
        let tagged: Vec<Vec<TaggedToken>> =
            sequences.iter().map(|s| self.tagger.tag(s)).collect();
        let (lemma_sequences, lemma_map) =
            lemmatize_chunk(&self.lemmatizer, &tagged, progress.as_ref());
        if let Some(pb) = progress {
            pb.finish_with_message("Lemmatization complete");
        }
        info!(
            "✅ Lemmatized {} sequences sequentially in {:.2?} ({} distinct lemmas)",
            sequences.len(),
            start.elapsed(),
            lemma_map.len()
        );
        LemmatizationOutput {
            lemma_sequences,
            lemma_map,
        }
    }
}

fn lemmatize_chunk(
    lemmatizer: &WordNetLemmatizer,
    tagged: &[Vec<TaggedToken>],
    progress: Option<&ProgressBar>,
) -> (Vec<TokenSequence>, LemmaMap) {
    let mut map = LemmaMap::new();
    let mut sequences = Vec::with_capacity(tagged.len());
    for sentence in tagged {
        let mut lemmas = Vec::with_capacity(sentence.len());
        for tagged_token in sentence {
            let lemma = lemmatizer.lemmatize(&tagged_token.token, tagged_token.wordnet_pos());
            map.record(&lemma, &tagged_token.token);
            lemmas.push(lemma);
        }
        sequences.push(lemmas);
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }
    (sequences, map)
}

/// Splits `items` into at most `parts` contiguous chunks of near-equal size.
fn partition<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    let chunk_size = items.len().div_ceil(parts.max(1)).max(1);
    let mut chunks = Vec::with_capacity(parts);
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(chunk_size).collect());
    }
    chunks
}
