// src/dataset/info.rs

use log::info;
use std::collections::HashSet;

use crate::models::Document;

/// Size summary of a prepared corpus. Words are counted by single-space split, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub documents: usize,
    pub total_words: usize,
    pub unique_words: usize,
    pub average_length: f64,
}

impl DatasetInfo {
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut total_words = 0;
        let mut vocabulary: HashSet<&str> = HashSet::new();
        for document in documents {
            for word in document.description.split(' ') {
                total_words += 1;
                vocabulary.insert(word);
            }
        }
        let average_length = if documents.is_empty() {
            0.0
        } else {
            total_words as f64 / documents.len() as f64
        };
        Self {
            documents: documents.len(),
            total_words,
            unique_words: vocabulary.len(),
            average_length,
        }
    }

    pub fn log_summary(&self, dataset: &str) {
        info!("== INFO FOR {} DATASET ==", dataset.to_uppercase());
        info!("==== PREPARED DATASET ====");
        info!("         # Docs: {}", self.documents);
        info!("    Total Words: {}", self.total_words);
        info!("   Unique Words: {}", self.unique_words);
        info!("    Avg Doc Len: {:.2}", self.average_length);
    }
}
