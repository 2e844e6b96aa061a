//! Reading and writing index files.
//!
//! (De)serialization runs in `spawn_blocking` since it is CPU bound. Writes go
//! to a sibling temp file first and are renamed into place, so a reader never
//! observes a half-written index.

use crate::error::{LoadError, Result};
use crate::search::{Format, Index, SearchHandle, deserialize, serialize};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// What [`publish`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The file was (re)written
    Written,
    /// An index with the same content digest and format was already in place
    Unchanged,
}

/// Writes `index` to `path` in `format`, replacing any existing file.
pub async fn save(index: &Index, path: &Path, format: Format) -> Result<()> {
    let path = path.to_path_buf();
    let index = index.clone();

    tokio::task::spawn_blocking(move || write_atomic(&index, &path, format))
        .await
        .context("Index writing task panicked")?
}

fn write_atomic(index: &Index, path: &Path, format: Format) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let bytes = serialize(index, format)
        .with_context(|| format!("Failed to encode {} index", format))?;
    let tmp = temp_path(path);

    std::fs::write(&tmp, &bytes)
        .with_context(|| format!("Failed to write index to {}", tmp.display()))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to move index into {}", path.display()));
    }

    tracing::debug!(
        "Wrote {} index ({} bytes) to {}",
        format,
        bytes.len(),
        path.display()
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Loads an index, inferring the format from the file extension.
pub async fn load(path: &Path) -> Result<Index, LoadError> {
    load_as(path, Format::from_path(path)).await
}

/// Loads an index in an explicit format.
pub async fn load_as(path: &Path, format: Format) -> Result<Index, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tokio::task::spawn_blocking(move || deserialize(&bytes, format))
        .await
        .map_err(|e| LoadError::Malformed(format!("index loading task failed: {e}")))?
}

/// Writes `index` unless the file at `path` already holds the same content.
///
/// The existing file is compared by content digest, which also covers the
/// tokenizer settings; an unreadable or outdated file is simply overwritten.
pub async fn publish(index: &Index, path: &Path, format: Format) -> Result<PublishOutcome> {
    match load_as(path, format).await {
        Ok(existing) if existing.digest() == index.digest() => {
            tracing::info!(
                "Index at {} is up to date (digest {})",
                path.display(),
                index.digest()
            );
            return Ok(PublishOutcome::Unchanged);
        }
        Ok(existing) => {
            tracing::debug!(
                "Replacing index at {} (digest {} -> {})",
                path.display(),
                existing.digest(),
                index.digest()
            );
        }
        Err(LoadError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::info!("Existing index will be rebuilt: {}", e);
        }
    }

    save(index, path, format).await?;
    Ok(PublishOutcome::Written)
}

/// Opens a search handle for a client session.
///
/// Never fails: a missing or corrupt index yields an unavailable handle so
/// the caller can show "search unavailable" instead of empty results.
pub async fn open_handle(path: &Path) -> SearchHandle {
    match load(path).await {
        Ok(index) => {
            tracing::debug!(
                "Loaded search index from {} ({} terms, {} docs)",
                path.display(),
                index.term_count(),
                index.document_count()
            );
            SearchHandle::ready(index)
        }
        Err(e) => {
            tracing::warn!("Search unavailable: {}", e);
            SearchHandle::unavailable(e.to_string())
        }
    }
}
