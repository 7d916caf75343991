// src/text/lemmatizer.rs
//! Dictionary-based lemmatization using WordNet's morphological rules ("morphy").
//!
//! A word is first looked up in the exception list for its part of speech; otherwise suffix
//! detachment rules are applied repeatedly and every candidate is checked against the lexicon.
//! The shortest surviving candidate wins; a word with no candidate is its own lemma.

use anyhow::{ensure, Context, Result};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::tagger::WordNetPos;

const NOUN_RULES: [(&str, &str); 9] = [
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: [(&str, &str); 8] = [
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const ADJECTIVE_RULES: [(&str, &str); 4] = [("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

fn detachment_rules(pos: WordNetPos) -> &'static [(&'static str, &'static str)] {
    match pos {
        WordNetPos::Noun => &NOUN_RULES,
        WordNetPos::Verb => &VERB_RULES,
        WordNetPos::Adjective => &ADJECTIVE_RULES,
        WordNetPos::Adverb => &[],
    }
}

/// Known lemmas and irregular forms, per part of speech.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    lemmas: HashMap<WordNetPos, HashSet<String>>,
    exceptions: HashMap<WordNetPos, HashMap<String, Vec<String>>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lemma(&mut self, pos: WordNetPos, lemma: &str) {
        self.lemmas.entry(pos).or_default().insert(lemma.to_string());
    }

    pub fn add_exception(&mut self, pos: WordNetPos, form: &str, lemmas: &[&str]) {
        self.exceptions
            .entry(pos)
            .or_default()
            .insert(form.to_string(), lemmas.iter().map(|l| l.to_string()).collect());
    }

    pub fn has_index(&self, pos: WordNetPos) -> bool {
        self.lemmas.get(&pos).map_or(false, |set| !set.is_empty())
    }

    pub fn contains(&self, pos: WordNetPos, lemma: &str) -> bool {
        self.lemmas
            .get(&pos)
            .map_or(false, |set| set.contains(lemma))
    }

    pub fn exceptions_for(&self, pos: WordNetPos, form: &str) -> Option<&[String]> {
        self.exceptions
            .get(&pos)
            .and_then(|map| map.get(form))
            .map(|v| v.as_slice())
    }

    /// Loads `index.{noun,verb,adj,adv}` and `{noun,verb,adj,adv}.exc` from a WordNet `dict/`
    /// directory. Missing files are skipped with a warning; unreadable ones are errors, and so is
    /// a directory without any index file.
    pub fn load_wordnet_dir(dir: &Path) -> Result<Self> {
        let mut lexicon = Self::new();

        for pos in WordNetPos::ALL {
            let index_path = dir.join(format!("index.{}", pos.file_suffix()));
            if index_path.exists() {
                let file = File::open(&index_path)
                    .with_context(|| format!("Failed to open {}", index_path.display()))?;
                for line in BufReader::new(file).lines() {
                    let line = line
                        .with_context(|| format!("Failed to read {}", index_path.display()))?;
                    // License preamble lines are indented
                    if line.starts_with(' ') {
                        continue;
                    }
                    if let Some(lemma) = line.split_whitespace().next() {
                        lexicon.add_lemma(pos, lemma);
                    }
                }
            } else {
                warn!("WordNet index file missing: {}", index_path.display());
            }

            let exc_path = dir.join(format!("{}.exc", pos.file_suffix()));
            if exc_path.exists() {
                let file = File::open(&exc_path)
                    .with_context(|| format!("Failed to open {}", exc_path.display()))?;
                for line in BufReader::new(file).lines() {
                    let line =
                        line.with_context(|| format!("Failed to read {}", exc_path.display()))?;
                    let mut fields = line.split_whitespace();
                    if let Some(form) = fields.next() {
                        let lemmas: Vec<&str> = fields.collect();
                        if !lemmas.is_empty() {
                            lexicon.add_exception(pos, form, &lemmas);
                        }
                    }
                }
            }
        }

        ensure!(
            WordNetPos::ALL.iter().any(|pos| lexicon.has_index(*pos)),
            "No WordNet index files with lemmas found in {}",
            dir.display()
        );
        info!(
            "Loaded WordNet lexicon from {}: {} noun, {} verb, {} adjective, {} adverb lemmas",
            dir.display(),
            lexicon.lemma_count(WordNetPos::Noun),
            lexicon.lemma_count(WordNetPos::Verb),
            lexicon.lemma_count(WordNetPos::Adjective),
            lexicon.lemma_count(WordNetPos::Adverb),
        );
        Ok(lexicon)
    }

    pub fn lemma_count(&self, pos: WordNetPos) -> usize {
        self.lemmas.get(&pos).map_or(0, |set| set.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct WordNetLemmatizer {
    lexicon: Lexicon,
}

impl WordNetLemmatizer {
    pub fn new(lexicon: Lexicon) -> Self {
        for pos in WordNetPos::ALL {
            if !lexicon.has_index(pos) {
                warn!(
                    "No {} lemmas in lexicon; {} forms only resolve through exception lists",
                    pos.file_suffix(),
                    pos.file_suffix()
                );
            }
        }
        Self { lexicon }
    }

    pub fn lemmatize(&self, word: &str, pos: WordNetPos) -> String {
        let candidates = self.morphy(word, pos);
        candidates
            .into_iter()
            .reduce(|best, next| if next.len() < best.len() { next } else { best })
            .unwrap_or_else(|| word.to_string())
    }

    fn morphy(&self, word: &str, pos: WordNetPos) -> Vec<String> {
        if !self.lexicon.has_index(pos) {
            // Without an index nothing can be validated; trust the exception list.
            return self
                .lexicon
                .exceptions_for(pos, word)
                .and_then(|lemmas| lemmas.first().cloned())
                .into_iter()
                .collect();
        }

        if let Some(lemmas) = self.lexicon.exceptions_for(pos, word) {
            let mut forms = vec![word.to_string()];
            forms.extend(lemmas.iter().cloned());
            return self.known_forms(pos, forms);
        }

        let mut forms = apply_rules(pos, &[word.to_string()]);
        let mut first = vec![word.to_string()];
        first.extend(forms.iter().cloned());
        let found = self.known_forms(pos, first);
        if !found.is_empty() {
            return found;
        }

        while !forms.is_empty() {
            forms = apply_rules(pos, &forms);
            let found = self.known_forms(pos, forms.clone());
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Keeps forms present in the lexicon, first occurrence only.
    fn known_forms(&self, pos: WordNetPos, forms: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        forms
            .into_iter()
            .filter(|form| self.lexicon.contains(pos, form) && seen.insert(form.clone()))
            .collect()
    }
}

fn apply_rules(pos: WordNetPos, forms: &[String]) -> Vec<String> {
    let rules = detachment_rules(pos);
    forms
        .iter()
        .flat_map(|form| {
            rules.iter().filter_map(move |(old, new)| {
                form.strip_suffix(old).map(|stem| format!("{}{}", stem, new))
            })
        })
        .collect()
}
