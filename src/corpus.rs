//! Source document discovery for a documentation tree.
//!
//! Walks a directory, keeps files with a configured extension and turns each
//! into a [`SourceDocument`] with a path relative to the root and a title
//! extracted from the markup.

use crate::config::CorpusConfig;
use crate::error::Result;
use crate::types::SourceDocument;
use anyhow::{Context, bail};
use ignore::WalkBuilder;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static HTML_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static HTML_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());
static HTML_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<!--.*?-->").unwrap()
});
// `<head>` but not `<header>`
static HTML_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head(?:\s[^>]*)?>.*?</head\s*>").unwrap());
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static MD_ATX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t#]*$").unwrap());
static FRONT_MATTER_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^title:[ \t]*["']?(.+?)["']?[ \t]*$"#).unwrap()
});

/// Markup flavour, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Markup {
    Markdown,
    ReStructuredText,
    Html,
    Plain,
}

impl Markup {
    pub(crate) fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("md" | "markdown") => Self::Markdown,
            Some("rst") => Self::ReStructuredText,
            Some("html" | "htm") => Self::Html,
            _ => Self::Plain,
        }
    }
}

/// Loads every matching document under `root`, ordered by relative path.
///
/// Files that cannot be read as UTF-8, or exceed the configured size, are
/// still returned (without text) so the index builder reports them as skipped.
pub fn load_corpus(root: &Path, config: &CorpusConfig) -> Result<Vec<SourceDocument>> {
    if !root.is_dir() {
        bail!("Source directory {} does not exist", root.display());
    }

    let mut files: Vec<(String, PathBuf)> = WalkBuilder::new(root)
        .require_git(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| config.accepts(entry.path()))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?.to_path_buf();
            Some((relative_path(&relative), entry.into_path()))
        })
        .collect();

    files.sort_by(|(a, _), (b, _)| a.cmp(b));

    let max_bytes = config.max_file_size_kb.saturating_mul(1024);
    let documents: Vec<SourceDocument> = files
        .into_iter()
        .map(|(relative, full)| read_document(relative, &full, max_bytes))
        .collect();

    tracing::debug!(
        "Discovered {} source documents under {}",
        documents.len(),
        root.display()
    );

    Ok(documents)
}

fn read_document(relative: String, full: &Path, max_bytes: u64) -> SourceDocument {
    let fallback_title = file_stem(full);

    let size = std::fs::metadata(full).map(|m| m.len()).unwrap_or(0);
    if size > max_bytes {
        tracing::warn!(
            "{} is {} bytes, over the {} byte limit",
            relative,
            size,
            max_bytes
        );
        return SourceDocument::without_text(relative, fallback_title);
    }

    match read_utf8(full) {
        Ok(raw) => {
            let (title, text) = extract(Markup::from_path(full), &raw);
            SourceDocument::new(relative, title.unwrap_or(fallback_title), text)
        }
        Err(e) => {
            tracing::warn!("Cannot read {}: {:#}", relative, e);
            SourceDocument::without_text(relative, fallback_title)
        }
    }
}

fn read_utf8(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    String::from_utf8(bytes).context("File is not valid UTF-8")
}

/// Splits raw markup into an optional title and the text to index.
pub(crate) fn extract(markup: Markup, raw: &str) -> (Option<String>, String) {
    match markup {
        Markup::Html => {
            let title = HTML_TITLE
                .captures(raw)
                .or_else(|| HTML_H1.captures(raw))
                .map(|caps| clean_inline(&strip_html(&caps[1])))
                .filter(|title| !title.is_empty());
            (title, strip_html(&HTML_HEAD.replace_all(raw, " ")))
        }
        Markup::Markdown => {
            let title = front_matter_title(raw)
                .or_else(|| {
                    MD_ATX
                        .captures(raw)
                        .map(|caps| clean_inline(&caps[1]))
                })
                .or_else(|| underlined_heading(raw, &['=', '-']));
            (title, markdown_text(raw))
        }
        Markup::ReStructuredText => {
            let title = underlined_heading(raw, &['=', '-', '~', '^', '*', '+', '#', '"', '`']);
            (title, raw.to_string())
        }
        Markup::Plain => (None, raw.to_string()),
    }
}

fn front_matter_title(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    FRONT_MATTER_TITLE
        .captures(&rest[..end])
        .map(|caps| clean_inline(&caps[1]))
        .filter(|title| !title.is_empty())
}

/// First line followed by an underline of a single repeated marker at least
/// as long as the line itself (setext / reStructuredText section title).
fn underlined_heading(raw: &str, markers: &[char]) -> Option<String> {
    let lines: Vec<&str> = raw.lines().collect();
    lines.windows(2).find_map(|pair| {
        let text = pair[0].trim();
        let underline = pair[1].trim_end();
        let marker = underline.chars().next()?;

        let is_underline = markers.contains(&marker)
            && underline.chars().all(|c| c == marker)
            && underline.chars().count() >= text.chars().count();
        let is_text = !text.is_empty() && !text.chars().all(|c| c == marker);

        (is_underline && is_text).then(|| clean_inline(text))
    })
}

/// Removes tags, scripts and styles, then decodes character references.
pub(crate) fn strip_html(raw: &str) -> String {
    let without_noise = HTML_NOISE.replace_all(raw, " ");
    let without_tags = HTML_TAG.replace_all(&without_noise, " ");
    html_escape::decode_html_entities(&without_tags).into_owned()
}

/// Readable text of a Markdown document.
///
/// Only text, inline code and code block contents are kept. Link targets,
/// fence info strings and front matter never reach the index.
fn markdown_text(raw: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;

    let mut text = String::with_capacity(raw.len());
    let mut in_metadata = false;
    for event in Parser::new_ext(raw, options) {
        match event {
            Event::Start(Tag::MetadataBlock(_)) => in_metadata = true,
            Event::End(TagEnd::MetadataBlock(_)) => in_metadata = false,
            _ if in_metadata => {}
            Event::Text(chunk) | Event::Code(chunk) => text.push_str(&chunk),
            Event::Html(html) | Event::InlineHtml(html) => text.push_str(&strip_html(&html)),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::BlockQuote(_)
                | TagEnd::CodeBlock
                | TagEnd::HtmlBlock
                | TagEnd::List(_)
                | TagEnd::Item
                | TagEnd::FootnoteDefinition
                | TagEnd::TableHead
                | TagEnd::TableRow
                | TagEnd::TableCell,
            ) => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Collapses whitespace and drops inline markup characters around a title.
fn clean_inline(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, '*' | '_' | '`'))
        .to_string()
}

fn relative_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
