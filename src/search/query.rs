//! Query evaluation and the client-facing search handle.

use std::sync::Arc;

use ahash::AHashSet;

use crate::error::IndexUnavailable;
use crate::types::{DocId, Document};

use super::index::Index;

/// Intersects ascending postings lists, in the order given.
///
/// Returns an empty list when `lists` is empty. The result is ascending.
pub(crate) fn intersect_postings(lists: &[&[DocId]]) -> Vec<DocId> {
    let Some((first, rest)) = lists.split_first() else {
        return vec![];
    };

    let mut acc = first.to_vec();
    for list in rest {
        if acc.is_empty() {
            break;
        }
        acc = intersect_two(&acc, list);
    }
    acc
}

fn intersect_two(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Drops repeated words, keeping first occurrences in order.
pub(crate) fn unique_in_order(words: Vec<String>) -> Vec<String> {
    let mut seen = AHashSet::with_capacity(words.len());
    words
        .into_iter()
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// A search result entry, as returned to the text-box client.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub path: String,
    pub title: String,
}

impl SearchHit {
    fn new(id: DocId, document: &Document) -> Self {
        Self {
            id,
            path: document.path.clone(),
            title: document.title.clone(),
        }
    }
}

/// What a client session holds: either a loaded index or the reason there is none.
///
/// Cloning is cheap; the index itself is shared.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    state: HandleState,
}

#[derive(Debug, Clone)]
enum HandleState {
    Ready(Arc<Index>),
    Unavailable(String),
}

impl SearchHandle {
    pub fn ready(index: impl Into<Arc<Index>>) -> Self {
        Self {
            state: HandleState::Ready(index.into()),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: HandleState::Unavailable(reason.into()),
        }
    }

    pub const fn is_available(&self) -> bool {
        matches!(self.state, HandleState::Ready(_))
    }

    pub fn index(&self) -> Option<&Arc<Index>> {
        match &self.state {
            HandleState::Ready(index) => Some(index),
            HandleState::Unavailable(_) => None,
        }
    }

    /// Searches document text. `Ok(vec![])` means "no matches"; `Err` means
    /// there is no index to search.
    pub fn search(&self, text: &str) -> Result<Vec<SearchHit>, IndexUnavailable> {
        let index = self.require()?;
        Ok(hits(index, index.query_ids(text)))
    }

    /// Searches document titles only.
    pub fn search_titles(&self, text: &str) -> Result<Vec<SearchHit>, IndexUnavailable> {
        let index = self.require()?;
        Ok(hits(index, index.query_title_ids(text)))
    }

    fn require(&self) -> Result<&Arc<Index>, IndexUnavailable> {
        match &self.state {
            HandleState::Ready(index) => Ok(index),
            HandleState::Unavailable(reason) => Err(IndexUnavailable {
                reason: reason.clone(),
            }),
        }
    }
}

fn hits(index: &Index, ids: Vec<DocId>) -> Vec<SearchHit> {
    ids.into_iter()
        .filter_map(|id| index.document(id).map(|doc| SearchHit::new(id, doc)))
        .collect()
}
