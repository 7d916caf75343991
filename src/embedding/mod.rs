// src/embedding/mod.rs
pub mod vectorize;
pub mod word2vec;

use anyhow::{bail, Result};
use std::collections::HashMap;

/// Read-only token to vector lookup with a fixed output dimensionality.
pub trait EmbeddingLookup: Send + Sync {
    fn dimension(&self) -> usize;

    fn lookup(&self, token: &str) -> Option<&[f32]>;

    fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }
}

/// In-memory word vectors, stored contiguously in vocabulary order.
#[derive(Debug, Clone)]
pub struct WordVectors {
    dimension: usize,
    index: HashMap<String, usize>,
    data: Vec<f32>,
}

impl WordVectors {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    pub fn with_capacity(dimension: usize, words: usize) -> Self {
        Self {
            dimension,
            index: HashMap::with_capacity(words),
            data: Vec::with_capacity(words * dimension),
        }
    }

    /// Adds a word. A repeated word keeps its first vector.
    pub fn insert(&mut self, word: String, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            bail!(
                "Vector for '{}' has {} components, expected {}",
                word,
                vector.len(),
                self.dimension
            );
        }
        if self.index.contains_key(&word) {
            return Ok(());
        }
        self.index.insert(word, self.index.len());
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl EmbeddingLookup for WordVectors {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn lookup(&self, token: &str) -> Option<&[f32]> {
        let row = *self.index.get(token)?;
        let start = row * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }
}
