//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_documents`: the two-document corpus used throughout the property tests
//! - `docs_tree`: a temporary documentation tree with Markdown, reStructuredText,
//!   HTML and a few files the corpus loader must skip or report
//!
//! [`TempWorkspace`] provides the temp directory abstraction underneath.

#![allow(dead_code)] // Fixtures are shared across integration test crates

use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use termdex::SourceDocument;

/// A temporary directory for test isolation, removed on drop.
///
/// # Example
///
/// ```ignore
/// let workspace = TempWorkspace::new();
/// workspace.create_file("guide/intro.md", "# Intro");
/// assert!(workspace.path().join("guide/intro.md").exists());
/// ```
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Joins a relative path onto the workspace root.
    pub fn join(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: impl AsRef<[u8]>) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The example corpus: `sparse` occurs in both documents, `fast` only in the first.
#[fixture]
pub fn sample_documents() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new("a.md", "A", "fast sparse model"),
        SourceDocument::new("b.md", "B", "sparse inference engine"),
    ]
}

/// A small documentation tree on disk.
///
/// Ordered by relative path, the indexable documents are:
/// `api/reference.rst`, `guide/install.md`, `index.html`, `notes.txt`.
/// `binary.md` is not UTF-8 and must be reported as skipped; `logo.png`
/// and everything under the ignored `build/` directory must not appear.
#[fixture]
pub fn docs_tree() -> TempWorkspace {
    let workspace = TempWorkspace::new();
    workspace.create_file(
        "guide/install.md",
        "# Installing the Engine\n\nRun `pip install sparse-engine` to get started.\n",
    );
    workspace.create_file(
        "api/reference.rst",
        "API Reference\n=============\n\nThe inference engine exposes a compile function.\n",
    );
    workspace.create_file(
        "index.html",
        "<html><head><title>Sparse Docs</title></head>\
         <body><p>Welcome to the <b>sparse</b> model zoo.</p></body></html>",
    );
    workspace.create_file("notes.txt", "release notes for the engine");
    workspace.create_file("binary.md", [0xff_u8, 0xfe, 0x00, 0x41]);
    workspace.create_file("logo.png", [0x89_u8, 0x50, 0x4e, 0x47]);
    workspace.create_file(".gitignore", "build/\n");
    workspace.create_file("build/stale.md", "# Stale\n\nold generated output");
    workspace
}
