//! Content fingerprinting for published indexes.
//!
//! A digest covers the schema version, the tokenizer settings and every
//! indexed document (path, title and text), so two builds over the same
//! content carry the same digest and the store can skip rewriting an
//! unchanged index.

use crate::config::TokenizerConfig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// 64-bit xxh3 digest of indexed content.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ContentDigest(u64);

impl ContentDigest {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the digest as 16 lowercase hexadecimal characters
    pub fn as_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 16 {
            return Err(ParseDigestError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseDigestError::InvalidHex);
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseDigestError::InvalidHex)
    }
}

impl Serialize for ContentDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for digest parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDigestError {
    #[error("invalid hexadecimal characters in digest string")]
    InvalidHex,
    #[error("invalid digest length: expected 16 hex characters, got {0}")]
    InvalidLength(usize),
}

/// Streaming digest over the documents accepted by a build.
pub(crate) struct DigestBuilder {
    hasher: Xxh3,
}

impl DigestBuilder {
    pub(crate) fn new(schema_version: u32, tokenizer: &TokenizerConfig) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(&schema_version.to_le_bytes());
        hasher.update(&(tokenizer.min_token_length as u64).to_le_bytes());

        // Stop words act as a set; listing order must not change the digest
        let mut stop_words: Vec<String> = tokenizer
            .stop_words
            .iter()
            .map(|word| word.to_lowercase())
            .collect();
        stop_words.sort_unstable();
        stop_words.dedup();
        hasher.update(&(stop_words.len() as u64).to_le_bytes());
        for word in &stop_words {
            hasher.update(&(word.len() as u64).to_le_bytes());
            hasher.update(word.as_bytes());
        }

        Self { hasher }
    }

    /// Feeds one document. Fields are length-prefixed so that
    /// ("ab", "c") and ("a", "bc") hash differently.
    pub(crate) fn add_document(&mut self, path: &str, title: &str, text: &str) {
        for field in [path, title, text] {
            self.hasher.update(&(field.len() as u64).to_le_bytes());
            self.hasher.update(field.as_bytes());
        }
    }

    pub(crate) fn finish(&self) -> ContentDigest {
        ContentDigest(self.hasher.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[rstest]
    #[case("123456789abcdef0", 0x1234_5678_9abc_def0)]
    #[case("0000000000000000", 0)]
    #[case("ffffffffffffffff", u64::MAX)]
    #[case("00000000000000ff", 255)]
    fn test_digest_parsing(#[case] digest_str: &str, #[case] expected: u64) {
        let digest: ContentDigest = digest_str.parse().unwrap();
        check!(digest == ContentDigest::new(expected));
        check!(digest.to_string() == digest_str);
    }

    #[rstest]
    #[case("zzzzzzzzzzzzzzzz")]
    #[case("123456789abcdefg")]
    #[case("+23456789abcdef0")]
    fn test_invalid_hex(#[case] input: &str) {
        let_assert!(Err(err) = input.parse::<ContentDigest>());
        check!(err == ParseDigestError::InvalidHex);
    }

    #[rstest]
    #[case("", 0)]
    #[case("abc123", 6)]
    #[case("1234567890abcdef0", 17)]
    fn test_invalid_length(#[case] input: &str, #[case] len: usize) {
        let_assert!(Err(ParseDigestError::InvalidLength(actual)) = input.parse::<ContentDigest>());
        check!(actual == len);
    }

    #[test]
    fn test_serialization() {
        let digest = ContentDigest::new(255);
        let json = serde_json::to_string(&digest).unwrap();
        check!(json == "\"00000000000000ff\"");
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        check!(back == digest);
    }

    #[test]
    fn test_field_boundaries_matter() {
        let mut a = DigestBuilder::new(1, &TokenizerConfig::default());
        a.add_document("ab", "c", "");
        let mut b = DigestBuilder::new(1, &TokenizerConfig::default());
        b.add_document("a", "bc", "");
        check!(a.finish() != b.finish());
    }

    #[test]
    fn test_schema_version_matters() {
        let mut a = DigestBuilder::new(1, &TokenizerConfig::default());
        a.add_document("a.md", "A", "text");
        let mut b = DigestBuilder::new(2, &TokenizerConfig::default());
        b.add_document("a.md", "A", "text");
        check!(a.finish() != b.finish());
    }

    #[rstest]
    #[case(TokenizerConfig { min_token_length: 2, stop_words: vec![] })]
    #[case(TokenizerConfig { min_token_length: 1, stop_words: vec!["the".to_string()] })]
    fn test_tokenizer_settings_matter(#[case] tokenizer: TokenizerConfig) {
        let mut a = DigestBuilder::new(1, &TokenizerConfig::default());
        a.add_document("a.md", "A", "the text");
        let mut b = DigestBuilder::new(1, &tokenizer);
        b.add_document("a.md", "A", "the text");
        check!(a.finish() != b.finish());
    }

    #[test]
    fn test_stop_word_order_is_irrelevant() {
        let first = TokenizerConfig {
            min_token_length: 1,
            stop_words: vec!["the".to_string(), "a".to_string()],
        };
        let second = TokenizerConfig {
            min_token_length: 1,
            stop_words: vec!["A".to_string(), "the".to_string()],
        };
        check!(DigestBuilder::new(1, &first).finish() == DigestBuilder::new(1, &second).finish());
    }
}
