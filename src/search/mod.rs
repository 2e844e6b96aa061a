//! Static term index for documentation site search.
//!
//! This module provides normalization, the write-only build phase, the
//! read-only published index, and its serialized forms.

// Module declarations
pub(crate) mod builder;
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod tokenize;
pub(crate) mod wire;

// Public re-exports (used via lib.rs)
pub use builder::{IndexBuilder, build, build_with};
pub use index::{Index, PostingsMap, SCHEMA_VERSION};
pub use query::{SearchHandle, SearchHit};
pub use tokenize::Tokenizer;
pub use wire::{
    Format, deserialize, from_binary, from_json, from_script, serialize, to_binary, to_json,
    to_script,
};
