use serde::{Deserialize, Serialize};

/// Position of a document in the published index. Dense, starting at 0.
pub type DocId = u32;

/// A published document entry. Immutable once the index is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub title: String,
}

/// A document as supplied by the documentation pipeline, before indexing.
///
/// `text` is optional so that unreadable sources can still be passed along
/// and reported as skipped instead of disappearing silently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDocument {
    pub path: String,
    pub title: String,
    pub text: Option<String>,
}

impl SourceDocument {
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            text: Some(text.into()),
        }
    }

    /// A document whose body could not be obtained.
    pub fn without_text(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            text: None,
        }
    }
}

impl From<(&str, &str, &str)> for SourceDocument {
    fn from((path, title, text): (&str, &str, &str)) -> Self {
        Self::new(path, title, text)
    }
}

/// Why a source document was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingText,
    EmptyPath,
    DuplicatePath,
    /// Every [`DocId`] is already taken
    OrdinalSpaceExhausted,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingText => write!(f, "document has no text"),
            Self::EmptyPath => write!(f, "document has an empty path"),
            Self::DuplicatePath => write!(f, "path already indexed"),
            Self::OrdinalSpaceExhausted => write!(f, "no document ordinals left"),
        }
    }
}

/// A malformed document that the builder skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    /// Position in the input sequence (not an index ordinal)
    pub position: usize,
    pub path: String,
    pub reason: SkipReason,
}
