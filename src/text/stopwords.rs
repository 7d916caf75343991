// src/text/stopwords.rs
//! Word lists used by the normalizer and the labeler. Lists are plain values handed to the
//! components that use them, so alternate lists never leak across the process.

use std::collections::HashSet;

/// Standard English stopword list (the NLTK corpus list).
pub const ENGLISH_STOPWORDS: [&str; 179] = [
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
    "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven",
    "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn",
    "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't",
    "won", "won't", "wouldn", "wouldn't",
];

/// Project amendments to the English list.
const EXTRA_STOPWORDS: [&str; 3] = ["do", "does", "to"];
/// Informative for vulnerability text ("which versions ...").
const KEPT_WORDS: [&str; 1] = ["which"];

/// Domain-generic terms that say nothing about a cluster's topic.
pub const DOMAIN_IGNORE_WORDS: [&str; 24] = [
    "vulnerability", "vulnerabilities", "vulnerable", "attacker", "attackers", "attack",
    "fix", "fixed", "fixes", "issue", "issues", "bug", "allow", "allows", "allowed", "could",
    "may", "via", "user", "users", "remote", "VERVER", "NUMNUM", "HEXHEX",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stoplist {
    words: HashSet<String>,
}

impl Stoplist {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// English stopwords with the project amendments applied.
    pub fn english() -> Self {
        Self::from_words(ENGLISH_STOPWORDS)
            .with(EXTRA_STOPWORDS)
            .without(KEPT_WORDS)
    }

    /// Ignore-list for the filtered labeling mode.
    pub fn domain_ignore() -> Self {
        Self::from_words(DOMAIN_IGNORE_WORDS)
    }

    pub fn with<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn without<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.words.remove(word.as_ref());
        }
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
