// src/text/tagger.rs
//! Part-of-speech tagging with Penn Treebank tags.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::normalize::{HEX_PLACEHOLDER, NUMBER_PLACEHOLDER, VERSION_PLACEHOLDER};

/// WordNet lexical category a lemma is looked up under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WordNetPos {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl WordNetPos {
    pub const ALL: [WordNetPos; 4] = [
        WordNetPos::Noun,
        WordNetPos::Verb,
        WordNetPos::Adjective,
        WordNetPos::Adverb,
    ];

    /// Maps a Treebank tag by its first letter (N, V, J, R); anything else is a noun.
    pub fn from_tag(tag: &str) -> Self {
        match tag.chars().next() {
            Some('V') => WordNetPos::Verb,
            Some('J') => WordNetPos::Adjective,
            Some('R') => WordNetPos::Adverb,
            _ => WordNetPos::Noun,
        }
    }

    /// Suffix used by the WordNet dictionary files (`index.noun`, `verb.exc`, ...).
    pub fn file_suffix(&self) -> &'static str {
        match self {
            WordNetPos::Noun => "noun",
            WordNetPos::Verb => "verb",
            WordNetPos::Adjective => "adj",
            WordNetPos::Adverb => "adv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn wordnet_pos(&self) -> WordNetPos {
        WordNetPos::from_tag(&self.tag)
    }
}

pub trait PosTagger: Send + Sync {
    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken>;
}

const CLOSED_CLASS_TAGS: [(&str, &str); 52] = [
    ("the", "DT"), ("a", "DT"), ("an", "DT"), ("this", "DT"), ("these", "DT"), ("any", "DT"),
    ("and", "CC"), ("or", "CC"), ("but", "CC"), ("nor", "CC"),
    ("in", "IN"), ("of", "IN"), ("on", "IN"), ("with", "IN"), ("via", "IN"), ("by", "IN"),
    ("for", "IN"), ("from", "IN"), ("through", "IN"), ("before", "IN"), ("after", "IN"),
    ("when", "WRB"), ("which", "WDT"), ("that", "WDT"), ("to", "TO"),
    ("be", "VB"), ("is", "VBZ"), ("are", "VBP"), ("was", "VBD"), ("were", "VBD"),
    ("been", "VBN"), ("has", "VBZ"), ("have", "VBP"), ("had", "VBD"),
    ("can", "MD"), ("could", "MD"), ("may", "MD"), ("might", "MD"), ("must", "MD"),
    ("should", "MD"), ("would", "MD"), ("will", "MD"),
    ("not", "RB"), ("also", "RB"), ("only", "RB"), ("prior", "RB"),
    ("allows", "VBZ"), ("allow", "VB"), ("execute", "VB"), ("cause", "VB"), ("obtain", "VB"),
    ("leads", "VBZ"),
];

const ADJECTIVE_SUFFIXES: [&str; 7] = ["ous", "ful", "less", "able", "ible", "ive", "ical"];
const VERB_SUFFIXES: [&str; 3] = ["ize", "ise", "ify"];

/// Word-level tagger: exact-word lexicon first, then suffix heuristics, then `NN`.
#[derive(Debug, Clone)]
pub struct SuffixTagger {
    lexicon: HashMap<String, String>,
}

impl Default for SuffixTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl SuffixTagger {
    pub fn new() -> Self {
        let lexicon = CLOSED_CLASS_TAGS
            .iter()
            .map(|(word, tag)| (word.to_string(), tag.to_string()))
            .collect();
        Self { lexicon }
    }

    /// Adds (or replaces) exact-word tags.
    pub fn with_lexicon(mut self, entries: HashMap<String, String>) -> Self {
        for (word, tag) in entries {
            self.lexicon.insert(word.to_lowercase(), tag);
        }
        self
    }

    /// Reads `word<TAB>TAG` lines; blank lines and `#` comments are skipped.
    pub fn load_lexicon(path: &Path) -> Result<HashMap<String, String>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open tagger lexicon {}", path.display()))?;
        let mut entries = HashMap::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.context("Failed to read line from tagger lexicon")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            match (fields.next(), fields.next()) {
                (Some(word), Some(tag)) if !word.is_empty() && !tag.trim().is_empty() => {
                    entries.insert(word.to_lowercase(), tag.trim().to_string());
                }
                _ => bail!(
                    "Malformed tagger lexicon line {} in {}: {:?}",
                    line_no + 1,
                    path.display(),
                    line
                ),
            }
        }
        info!("Loaded {} tagger lexicon entries from {}", entries.len(), path.display());
        Ok(entries)
    }

    fn tag_word(&self, token: &str) -> String {
        if [VERSION_PLACEHOLDER, NUMBER_PLACEHOLDER, HEX_PLACEHOLDER].contains(&token) {
            return "CD".to_string();
        }
        let lower = token.to_lowercase();
        if let Some(tag) = self.lexicon.get(&lower) {
            return tag.clone();
        }
        if !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit()) {
            return "CD".to_string();
        }

        let len = lower.chars().count();
        let tag = if len > 4 && lower.ends_with("ing") {
            "VBG"
        } else if len > 3 && lower.ends_with("ed") {
            "VBD"
        } else if len > 3 && lower.ends_with("ly") {
            "RB"
        } else if ADJECTIVE_SUFFIXES.iter().any(|s| len > s.len() + 1 && lower.ends_with(s)) {
            "JJ"
        } else if VERB_SUFFIXES.iter().any(|s| len > s.len() + 1 && lower.ends_with(s)) {
            "VB"
        } else if len > 3
            && lower.ends_with('s')
            && !(lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is"))
        {
            "NNS"
        } else {
            "NN"
        };
        tag.to_string()
    }
}

impl PosTagger for SuffixTagger {
    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken> {
        let tagged: Vec<TaggedToken> = tokens
            .iter()
            .map(|token| TaggedToken {
                token: token.clone(),
                tag: self.tag_word(token),
            })
            .collect();
        debug!("Tagged {} tokens", tagged.len());
        tagged
    }
}
