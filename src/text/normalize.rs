// src/text/normalize.rs
//! Description cleanup: lowercasing, placeholder substitution for version, number and hex
//! tokens, punctuation stripping and stopword removal.
//!
//! Substitution runs as a single left-to-right pass over whitespace-delimited words, so a
//! comma-separated run such as `18.2x75-d41, 19.1r2-s1, 17.3r3-s8` is replaced in full.

use once_cell::sync::Lazy;
use regex::Regex;

use super::stopwords::Stoplist;

pub const VERSION_PLACEHOLDER: &str = "VERVER";
pub const NUMBER_PLACEHOLDER: &str = "NUMNUM";
pub const HEX_PLACEHOLDER: &str = "HEXHEX";

const PLACEHOLDERS: [&str; 3] = [VERSION_PLACEHOLDER, NUMBER_PLACEHOLDER, HEX_PLACEHOLDER];

/// Words that introduce a detached version number: `v 1.2`, `ver. 1.2`.
const VERSION_PREFIXES: [&str; 3] = ["v", "ver", "ver."];

static RE_NUMERIC_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9._]*[0-9][0-9._]*$").unwrap());
static RE_PREFIXED_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v(?:er\.?)?[0-9._]*[0-9][0-9._]*$").unwrap());
static RE_FIRMWARE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+[rx][0-9]+(?:-[ds][0-9]+)?$").unwrap());
static RE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.?$").unwrap());
static RE_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[0-9a-z]+$").unwrap());
static RE_NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Classifies a single lowercased word. A trailing list comma is ignored.
fn classify_word(word: &str) -> Option<&'static str> {
    let core = word.strip_suffix(',').unwrap_or(word);
    if core.is_empty() {
        return None;
    }
    if RE_HEX.is_match(core) {
        return Some(HEX_PLACEHOLDER);
    }
    if RE_INTEGER.is_match(core) {
        return Some(NUMBER_PLACEHOLDER);
    }
    if RE_FIRMWARE_VERSION.is_match(core)
        || RE_PREFIXED_VERSION.is_match(core)
        || RE_NUMERIC_BODY.is_match(core)
    {
        return Some(VERSION_PLACEHOLDER);
    }
    None
}

fn is_placeholder(word: &str) -> bool {
    PLACEHOLDERS.contains(&word)
}

fn is_detached_version(word: &str) -> bool {
    let core = word.strip_suffix(',').unwrap_or(word);
    RE_NUMERIC_BODY.is_match(core)
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: Stoplist,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Stoplist::english())
    }
}

impl Normalizer {
    pub fn new(stopwords: Stoplist) -> Self {
        Self { stopwords }
    }

    /// Cleans a raw description. Empty output is valid; the caller decides whether to keep it.
    pub fn normalize(&self, text: &str) -> String {
        let text = text.replace(['\r', '\n'], " ");
        let words: Vec<&str> = text.trim_end().split_whitespace().collect();

        let mut tokens: Vec<String> = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            let word = words[i];
            i += 1;

            // Already normalized text keeps its placeholders.
            if is_placeholder(word) {
                tokens.push(word.to_string());
                continue;
            }

            let lower = word.to_lowercase();
            if VERSION_PREFIXES.contains(&lower.as_str())
                && i < words.len()
                && is_detached_version(&words[i].to_lowercase())
            {
                tokens.push(VERSION_PLACEHOLDER.to_string());
                i += 1;
                continue;
            }

            if let Some(placeholder) = classify_word(&lower) {
                tokens.push(placeholder.to_string());
                continue;
            }

            for fragment in RE_NON_ALPHANUMERIC.split(&lower) {
                if fragment.is_empty() {
                    continue;
                }
                match classify_word(fragment) {
                    Some(placeholder) => tokens.push(placeholder.to_string()),
                    None => tokens.push(fragment.to_string()),
                }
            }
        }

        tokens
            .into_iter()
            .filter(|token| !self.stopwords.contains(&token.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        Normalizer::default().normalize(text)
    }

    #[test]
    fn test_version_sentence() {
        assert_eq!(
            normalize("Version 1.2.3 allowed remote attacker to crash the system"),
            "version VERVER allowed remote attacker crash system"
        );
    }

    #[test]
    fn test_every_item_of_a_version_list_is_replaced() {
        assert_eq!(
            normalize("Fixed in 18.2x75-d41, 19.1r2-s1, 17.3r3-s8, 18.4r1-s6 and later"),
            "fixed VERVER VERVER VERVER VERVER later"
        );
        assert_eq!(
            normalize("affects 1.0, 1.1, 1.2, 1.3"),
            "affects VERVER VERVER VERVER VERVER"
        );
    }

    #[test]
    fn test_prefixed_versions() {
        assert_eq!(normalize("upgrade to v2.4.1 now"), "upgrade VERVER");
        assert_eq!(normalize("upgrade to v 2.4.1"), "upgrade VERVER");
        assert_eq!(normalize("see ver. 1.2 notes"), "see VERVER notes");
        assert_eq!(normalize("firmware 12.3r4-d5 only"), "firmware VERVER");
    }

    #[test]
    fn test_numbers_and_hex() {
        assert_eq!(
            normalize("Buffer of 256 bytes at 0x7ffe12 overflows"),
            "buffer NUMNUM bytes HEXHEX overflows"
        );
        assert_eq!(normalize("released in 2019."), "released NUMNUM");
        assert_eq!(normalize("ports 80, 443, 8080"), "ports NUMNUM NUMNUM NUMNUM");
    }

    #[test]
    fn test_punctuation_and_newlines() {
        assert_eq!(
            normalize("Cross-site scripting (XSS)\nin the\r\nadmin panel!!  "),
            "cross site scripting xss admin panel"
        );
        assert_eq!(normalize("it's the user's fault"), "user fault");
    }

    #[test]
    fn test_which_is_kept() {
        assert_eq!(normalize("Which versions does this affect"), "which versions affect");
    }

    #[test]
    fn test_empty_and_whitespace_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("the to of a"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Version 1.2.3 allowed remote attacker to crash the system",
            "abc-1.2 and v (1) then 0x1F, 0xdead",
            "Fixed in 18.2x75-d41, 19.1r2-s1 (see CVE-2020-1234).",
            "Use-after-free in V8 in Google Chrome prior to 79.0.3945.79",
            "ÉCOLE naïve résumé 3rd-party",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_injected_stoplist() {
        let normalizer = Normalizer::new(Stoplist::from_words(["crash"]));
        assert_eq!(normalizer.normalize("the crash"), "the");
    }
}
