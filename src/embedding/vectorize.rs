// src/embedding/vectorize.rs
//! Document vectors as the sum of their in-vocabulary token vectors.

use indicatif::ProgressBar;
use log::{info, warn};
use ndarray::{Array1, Array2, ArrayViewMut1};

use super::EmbeddingLookup;
use crate::text::TokenSequence;

/// Out-of-vocabulary tokens are skipped; a sequence with no known token yields zeros.
pub fn vectorize(tokens: &[String], embeddings: &dyn EmbeddingLookup) -> Array1<f64> {
    let mut vector = Array1::zeros(embeddings.dimension());
    accumulate(tokens, embeddings, vector.view_mut());
    vector
}

fn accumulate(tokens: &[String], embeddings: &dyn EmbeddingLookup, mut out: ArrayViewMut1<f64>) -> usize {
    let mut hits = 0;
    for token in tokens {
        if let Some(embedding) = embeddings.lookup(token) {
            for (acc, value) in out.iter_mut().zip(embedding) {
                *acc += f64::from(*value);
            }
            hits += 1;
        }
    }
    hits
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorizeStats {
    pub documents: usize,
    pub tokens: usize,
    pub tokens_in_vocabulary: usize,
    pub zero_vectors: usize,
}

impl VectorizeStats {
    pub fn coverage(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.tokens_in_vocabulary as f64 / self.tokens as f64
        }
    }
}

/// Vectorizes every document into one row each, keeping input order.
pub fn vectorize_corpus(
    sequences: &[TokenSequence],
    embeddings: &dyn EmbeddingLookup,
    progress: Option<&ProgressBar>,
) -> (Array2<f64>, VectorizeStats) {
    let mut matrix = Array2::zeros((sequences.len(), embeddings.dimension()));
    let mut stats = VectorizeStats {
        documents: sequences.len(),
        ..Default::default()
    };

    for (tokens, row) in sequences.iter().zip(matrix.rows_mut()) {
        let hits = accumulate(tokens, embeddings, row);
        stats.tokens += tokens.len();
        stats.tokens_in_vocabulary += hits;
        if hits == 0 {
            stats.zero_vectors += 1;
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    info!(
        "📐 Vectorized {} documents ({} dimensions), vocabulary coverage {:.1}%",
        stats.documents,
        embeddings.dimension(),
        stats.coverage() * 100.0
    );
    if stats.zero_vectors > 0 {
        warn!(
            "{} documents have no in-vocabulary tokens and were left as zero vectors",
            stats.zero_vectors
        );
    }
    (matrix, stats)
}
