//! Text normalization shared by index build and query.
//!
//! A term is a maximal run of alphanumeric characters, lowercased. Every other
//! character (whitespace, punctuation, `_`, `-`, symbols) is a separator, so
//! `snake_case` and `hyphen-case` both split into their parts.

use ahash::AHashSet;

use crate::config::TokenizerConfig;

/// Default minimum token length. 1 keeps short identifiers like `io` or `u8`.
pub(crate) const MIN_TOKEN_LENGTH: usize = 1;

/// Splits text into normalized terms.
///
/// The same instance (or one built from the same [`TokenizerConfig`]) must be
/// used for building and querying, otherwise lookups silently miss.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    min_token_length: usize,
    stop_words: AHashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            min_token_length: MIN_TOKEN_LENGTH,
            stop_words: AHashSet::default(),
        }
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            min_token_length: config.min_token_length.max(1),
            stop_words: config
                .stop_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        }
    }

    /// Tokenizes `text` into normalized terms, in order of appearance.
    /// Duplicates are kept; callers that need sets dedupe themselves.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = vec![];
        let mut word_start = None;

        for (i, c) in text.char_indices() {
            if c.is_alphanumeric() {
                if word_start.is_none() {
                    word_start = Some(i);
                }
            } else if let Some(start) = word_start.take() {
                self.push_token(&text[start..i], &mut tokens);
            }
        }

        if let Some(start) = word_start {
            self.push_token(&text[start..], &mut tokens);
        }

        tokens
    }

    /// Normalizes a single query word. Returns `None` when nothing indexable is left.
    pub fn normalize(&self, term: &str) -> Option<String> {
        let mut tokens = self.tokenize(term);
        (tokens.len() == 1).then(|| tokens.remove(0))
    }

    fn push_token(&self, raw: &str, tokens: &mut Vec<String>) {
        let lowercase = raw.to_lowercase();

        if lowercase.chars().count() < self.min_token_length {
            return;
        }
        if self.stop_words.contains(&lowercase) {
            return;
        }

        tokens.push(lowercase);
    }
}
