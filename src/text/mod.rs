// src/text/mod.rs
pub mod lemmatizer;
pub mod normalize;
pub mod parallel;
pub mod stopwords;
pub mod tagger;
pub mod tokenize;

pub use lemmatizer::{Lexicon, WordNetLemmatizer};
pub use normalize::Normalizer;
pub use parallel::{LemmaMap, LemmatizationOutput, ParallelLemmatizer};
pub use stopwords::Stoplist;
pub use tagger::{PosTagger, SuffixTagger, WordNetPos};
pub use tokenize::{word_tokenize, TokenSequence};
