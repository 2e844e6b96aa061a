//! Write-only build phase of the term index.

use ahash::{AHashMap, AHashSet};

use crate::config::TokenizerConfig;
use crate::error::BuildError;
use crate::fingerprint::DigestBuilder;
use crate::types::{DocId, Document, SkipReason, SkippedDocument, SourceDocument};

use super::index::{Index, PostingsMap, SCHEMA_VERSION};
use super::tokenize::Tokenizer;

/// Accumulates documents and their terms before producing an immutable [`Index`].
///
/// Single-threaded and one-shot: feed documents with [`add`](Self::add), then
/// call [`finalize`](Self::finalize).
pub struct IndexBuilder {
    tokenizer: Tokenizer,
    tokenizer_config: TokenizerConfig,
    documents: Vec<Document>,
    seen_paths: AHashSet<String>,
    /// Term → ordinals. Ordinals are handed out ascending and each document
    /// records a term at most once, so every list stays sorted and unique.
    terms: AHashMap<String, Vec<DocId>>,
    title_terms: AHashMap<String, Vec<DocId>>,
    skipped: Vec<SkippedDocument>,
    digest: DigestBuilder,
    /// Number of documents offered so far, accepted or not
    offered: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl IndexBuilder {
    pub fn new(tokenizer_config: &TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(tokenizer_config),
            tokenizer_config: tokenizer_config.clone(),
            documents: Vec::new(),
            seen_paths: AHashSet::default(),
            terms: AHashMap::default(),
            title_terms: AHashMap::default(),
            skipped: Vec::new(),
            digest: DigestBuilder::new(SCHEMA_VERSION, tokenizer_config),
            offered: 0,
        }
    }

    /// Adds one document, returning its ordinal.
    ///
    /// Malformed documents (no text, empty path, path already added) and
    /// documents past the last available ordinal are skipped with a warning and reported by [`skipped`](Self::skipped).
    pub fn add(&mut self, source: SourceDocument) -> Option<DocId> {
        let position = self.offered;
        self.offered += 1;

        let SourceDocument { path, title, text } = source;

        let id = next_ordinal(self.documents.len());
        let reason = if path.trim().is_empty() {
            Some(SkipReason::EmptyPath)
        } else if text.is_none() {
            Some(SkipReason::MissingText)
        } else if self.seen_paths.contains(&path) {
            Some(SkipReason::DuplicatePath)
        } else if id.is_none() {
            Some(SkipReason::OrdinalSpaceExhausted)
        } else {
            None
        };

        let (text, id) = match (text, id) {
            (Some(text), Some(id)) if reason.is_none() => (text, id),
            _ => {
                let reason = reason.unwrap_or(SkipReason::MissingText);
                tracing::warn!("Skipping document #{} '{}': {}", position, path, reason);
                self.skipped.push(SkippedDocument {
                    position,
                    path,
                    reason,
                });
                return None;
            }
        };

        let title = if title.trim().is_empty() {
            path.clone()
        } else {
            title
        };

        self.digest.add_document(&path, &title, &text);
        record_terms(&mut self.terms, self.tokenizer.tokenize(&text), id);
        record_terms(&mut self.title_terms, self.tokenizer.tokenize(&title), id);

        self.seen_paths.insert(path.clone());
        self.documents.push(Document { path, title });
        Some(id)
    }

    /// Adds every document from an iterator.
    pub fn extend<I, D>(&mut self, sources: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<SourceDocument>,
    {
        for source in sources {
            self.add(source.into());
        }
    }

    /// Documents skipped so far.
    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    /// Number of documents accepted so far.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Produces the published index.
    ///
    /// Fails only when no document at all was indexable.
    pub fn finalize(self) -> Result<Index, BuildError> {
        let start = std::time::Instant::now();

        if self.documents.is_empty() {
            return Err(BuildError::NoIndexableDocuments {
                skipped: self.skipped.len(),
            });
        }

        let term_doc_pairs: usize = self.terms.values().map(Vec::len).sum();
        let terms: PostingsMap = self.terms.into_iter().collect();
        let title_terms: PostingsMap = self.title_terms.into_iter().collect();

        let index = Index::assemble(
            self.documents,
            terms,
            title_terms,
            self.digest.finish(),
            self.tokenizer_config,
        );

        tracing::info!(
            "Built search index: {} unique terms, {} documents, {} term-document pairs, {} skipped in {:?}",
            index.term_count(),
            index.document_count(),
            term_doc_pairs,
            self.skipped.len(),
            start.elapsed()
        );

        Ok(index)
    }
}

/// Ordinal for the next accepted document, if one still fits in [`DocId`].
fn next_ordinal(accepted: usize) -> Option<DocId> {
    DocId::try_from(accepted).ok()
}

/// Records each distinct term of one document. A term already present
/// gains this ordinal; it is never duplicated as a key.
fn record_terms(map: &mut AHashMap<String, Vec<DocId>>, tokens: Vec<String>, id: DocId) {
    let mut seen = AHashSet::with_capacity(tokens.len());
    for token in tokens {
        if !seen.insert(token.clone()) {
            continue;
        }
        let postings = map.entry(token).or_default();
        if postings.last() != Some(&id) {
            postings.push(id);
        }
    }
}

/// Builds an index from `(path, title, text)` documents with default settings.
pub fn build<I, D>(documents: I) -> Result<Index, BuildError>
where
    I: IntoIterator<Item = D>,
    D: Into<SourceDocument>,
{
    build_with(documents, &TokenizerConfig::default())
}

/// Builds an index with explicit tokenizer settings.
pub fn build_with<I, D>(documents: I, config: &TokenizerConfig) -> Result<Index, BuildError>
where
    I: IntoIterator<Item = D>,
    D: Into<SourceDocument>,
{
    let mut builder = IndexBuilder::new(config);
    builder.extend(documents);
    builder.finalize()
}
