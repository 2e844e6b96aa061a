pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod search;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{BuildError, EncodeError, IndexUnavailable, LoadError};
pub use fingerprint::ContentDigest;
pub use search::{Format, Index, IndexBuilder, SearchHandle, SearchHit, build};
pub use types::{DocId, Document, SourceDocument};
