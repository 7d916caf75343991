// src/text/tokenize.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// A word keeps its inner hyphens, apostrophes and dots (`cross-site`, `1.2.3`); any other
/// punctuation character becomes a token of its own.
static RE_WORD_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+(?:[-'.]\w+)*|[^\w\s]").unwrap());

pub type TokenSequence = Vec<String>;

pub fn word_tokenize(text: &str) -> TokenSequence {
    RE_WORD_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Adjacent word pairs, in order.
pub fn bigrams(tokens: &[String]) -> Vec<(String, String)> {
    tokens
        .windows(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}
