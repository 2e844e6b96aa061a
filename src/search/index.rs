//! The published, read-only term index.

use std::collections::BTreeMap;

use crate::config::TokenizerConfig;
use crate::error::LoadError;
use crate::fingerprint::ContentDigest;
use crate::types::{DocId, Document};

use super::query::{intersect_postings, unique_in_order};
use super::tokenize::Tokenizer;

/// Version of the serialized layout. Content changes never bump it.
pub const SCHEMA_VERSION: u32 = 1;

/// Map from normalized term to the ascending ordinals of documents containing it.
pub type PostingsMap = BTreeMap<String, Vec<DocId>>;

/// An immutable term index.
///
/// Built once by [`IndexBuilder`](super::IndexBuilder) or loaded from a
/// serialized blob, then shared read-only (it is `Send + Sync`; wrap it in an
/// `Arc` to hand it to many readers).
#[derive(Debug, Clone)]
pub struct Index {
    documents: Vec<Document>,
    terms: PostingsMap,
    title_terms: PostingsMap,
    digest: ContentDigest,
    tokenizer_config: TokenizerConfig,
    /// Rebuilt from `tokenizer_config`, never serialized
    tokenizer: Tokenizer,
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.documents == other.documents
            && self.terms == other.terms
            && self.title_terms == other.title_terms
            && self.digest == other.digest
            && self.tokenizer_config == other.tokenizer_config
    }
}

impl Eq for Index {}

impl Index {
    /// Assembles an index from parts the builder already guarantees to be valid.
    pub(super) fn assemble(
        documents: Vec<Document>,
        terms: PostingsMap,
        title_terms: PostingsMap,
        digest: ContentDigest,
        tokenizer_config: TokenizerConfig,
    ) -> Self {
        let tokenizer = Tokenizer::new(&tokenizer_config);
        Self {
            documents,
            terms,
            title_terms,
            digest,
            tokenizer_config,
            tokenizer,
        }
    }

    /// Assembles an index from untrusted (deserialized) parts, checking every
    /// postings list against the document list.
    pub(crate) fn from_parts(
        documents: Vec<Document>,
        terms: PostingsMap,
        title_terms: PostingsMap,
        digest: ContentDigest,
        tokenizer_config: TokenizerConfig,
    ) -> Result<Self, LoadError> {
        if documents.is_empty() {
            return Err(LoadError::NoDocuments);
        }
        for (term, postings) in terms.iter().chain(&title_terms) {
            validate_postings(term, postings, documents.len())?;
        }

        Ok(Self::assemble(
            documents,
            terms,
            title_terms,
            digest,
            tokenizer_config,
        ))
    }

    /// Returns the documents whose text contains every word of `text`, in
    /// ordinal order.
    ///
    /// `text` is normalized with the same rule used at build time. An empty
    /// query, or one containing a word absent from the index, yields no
    /// documents.
    pub fn query(&self, text: &str) -> Vec<&Document> {
        self.lookup(&self.terms, text)
    }

    /// Like [`query`](Self::query), but matches against document titles only.
    pub fn query_titles(&self, text: &str) -> Vec<&Document> {
        self.lookup(&self.title_terms, text)
    }

    /// Ordinals matching `text`, ascending.
    pub fn query_ids(&self, text: &str) -> Vec<DocId> {
        self.matching_ids(&self.terms, text)
    }

    /// Ordinals whose title matches `text`, ascending.
    pub fn query_title_ids(&self, text: &str) -> Vec<DocId> {
        self.matching_ids(&self.title_terms, text)
    }

    fn lookup(&self, map: &PostingsMap, text: &str) -> Vec<&Document> {
        self.matching_ids(map, text)
            .into_iter()
            .filter_map(|id| self.document(id))
            .collect()
    }

    fn matching_ids(&self, map: &PostingsMap, text: &str) -> Vec<DocId> {
        let words = unique_in_order(self.tokenizer.tokenize(text));
        let mut lists = Vec::with_capacity(words.len());
        for word in &words {
            match map.get(word) {
                Some(postings) => lists.push(postings.as_slice()),
                None => return vec![],
            }
        }
        intersect_postings(&lists)
    }

    /// Postings for an already-normalized term. Empty if the term is absent.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.terms.get(term).map_or(&[], Vec::as_slice)
    }

    /// All terms with their postings, in term order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &[DocId])> {
        self.terms
            .iter()
            .map(|(term, postings)| (term.as_str(), postings.as_slice()))
    }

    /// All title terms with their postings, in term order.
    pub fn title_terms(&self) -> impl Iterator<Item = (&str, &[DocId])> {
        self.title_terms
            .iter()
            .map(|(term, postings)| (term.as_str(), postings.as_slice()))
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    pub fn tokenizer_config(&self) -> &TokenizerConfig {
        &self.tokenizer_config
    }

    pub(crate) const fn postings_map(&self) -> &PostingsMap {
        &self.terms
    }

    pub(crate) const fn title_postings_map(&self) -> &PostingsMap {
        &self.title_terms
    }
}

fn validate_postings(term: &str, postings: &[DocId], count: usize) -> Result<(), LoadError> {
    if postings.is_empty() {
        return Err(LoadError::EmptyPostings {
            term: term.to_string(),
        });
    }
    if !postings.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(LoadError::UnorderedPostings {
            term: term.to_string(),
        });
    }
    // Ascending, so the last entry is the largest
    if let Some(&ordinal) = postings.last()
        && ordinal as usize >= count
    {
        return Err(LoadError::OrdinalOutOfRange {
            term: term.to_string(),
            ordinal,
            count,
        });
    }
    Ok(())
}
