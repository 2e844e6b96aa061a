//! Configuration loaded from `termdex.toml`.
//!
//! Every field has a default, so an empty (or missing) file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::Format;

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "termdex.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TERMDEX_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Term normalization settings. Build and query must agree on these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenizerConfig {
    /// Tokens shorter than this (in characters) are dropped
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,

    /// Words never indexed, compared after lowercasing
    #[serde(default)]
    pub stop_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// File extensions (without dot) treated as source documents
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files larger than this are skipped
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Format,
}

const fn default_min_token_length() -> usize {
    crate::search::tokenize::MIN_TOKEN_LENGTH
}

fn default_extensions() -> Vec<String> {
    ["md", "markdown", "rst", "txt", "html", "htm"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_max_file_size_kb() -> u64 {
    2048
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: default_min_token_length(),
            stop_words: Vec::new(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_file_size_kb: default_max_file_size_kb(),
        }
    }
}

impl CorpusConfig {
    /// Whether `path` has one of the configured extensions (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

impl Config {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Reads and parses a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Resolves the effective configuration.
    ///
    /// An explicit path (argument, then `$TERMDEX_CONFIG`) must load. The
    /// implicit candidates (`./termdex.toml`, user config dir) are skipped
    /// with a warning when broken.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
            tracing::debug!("Loading config from {}", path.display());
            return Self::from_file(&path);
        }

        for candidate in implicit_candidates() {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_file(&candidate) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {}", candidate.display());
                    return Ok(config);
                }
                Err(e) => tracing::warn!("Ignoring config: {}", e),
            }
        }

        Ok(Self::default())
    }
}

fn implicit_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("termdex").join("config.toml"));
    }
    candidates
}
