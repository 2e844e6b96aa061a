//! Serialized forms of the index.
//!
//! - `json`: the client-facing blob. Single-entry postings are written as a
//!   bare integer. Unknown fields are ignored on load, so an older reader
//!   accepts a newer index as long as the schema version matches.
//! - `script`: the JSON blob wrapped in `Search.setIndex(...)` for direct
//!   inclusion in a page.
//! - `binary`: postcard, prefixed by the schema version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::TokenizerConfig;
use crate::error::{EncodeError, LoadError};
use crate::fingerprint::ContentDigest;
use crate::types::{DocId, Document};

use super::index::{Index, PostingsMap, SCHEMA_VERSION};

const SCRIPT_PREFIX: &str = "Search.setIndex(";
const SCRIPT_SUFFIX: &str = ")";

/// Output format of a serialized index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Script,
    Binary,
}

impl Format {
    /// Infers the format from a file extension: `.json`, `.js`, anything else is binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            Some(ext) if ext.eq_ignore_ascii_case("js") => Self::Script,
            _ => Self::Binary,
        }
    }

    /// Conventional file extension for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Script => "js",
            Self::Binary => "idx",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Script => "script",
            Self::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A postings list as written to JSON.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePostings {
    One(DocId),
    Many(Vec<DocId>),
}

impl From<&Vec<DocId>> for WirePostings {
    fn from(ids: &Vec<DocId>) -> Self {
        match ids.as_slice() {
            [id] => Self::One(*id),
            _ => Self::Many(ids.clone()),
        }
    }
}

impl From<WirePostings> for Vec<DocId> {
    fn from(postings: WirePostings) -> Self {
        match postings {
            WirePostings::One(id) => vec![id],
            WirePostings::Many(ids) => ids,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaHeader {
    schema: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonIndex {
    schema: u32,
    #[serde(default)]
    digest: ContentDigest,
    #[serde(default)]
    tokenizer: TokenizerConfig,
    filenames: Vec<String>,
    titles: Vec<String>,
    terms: BTreeMap<String, WirePostings>,
    #[serde(default, rename = "titleterms")]
    title_terms: BTreeMap<String, WirePostings>,
}

impl JsonIndex {
    fn from_index(index: &Index) -> Self {
        let (filenames, titles) = index
            .documents()
            .iter()
            .map(|doc| (doc.path.clone(), doc.title.clone()))
            .unzip();

        Self {
            schema: SCHEMA_VERSION,
            digest: index.digest(),
            tokenizer: index.tokenizer_config().clone(),
            filenames,
            titles,
            terms: compact(index.postings_map()),
            title_terms: compact(index.title_postings_map()),
        }
    }

    fn into_index(self) -> Result<Index, LoadError> {
        if self.filenames.len() != self.titles.len() {
            return Err(LoadError::DocumentListMismatch {
                filenames: self.filenames.len(),
                titles: self.titles.len(),
            });
        }

        let documents = self
            .filenames
            .into_iter()
            .zip(self.titles)
            .map(|(path, title)| Document { path, title })
            .collect();

        Index::from_parts(
            documents,
            expand(self.terms),
            expand(self.title_terms),
            self.digest,
            self.tokenizer,
        )
    }
}

fn compact(map: &PostingsMap) -> BTreeMap<String, WirePostings> {
    map.iter()
        .map(|(term, ids)| (term.clone(), WirePostings::from(ids)))
        .collect()
}

fn expand(map: BTreeMap<String, WirePostings>) -> PostingsMap {
    map.into_iter()
        .map(|(term, postings)| (term, postings.into()))
        .collect()
}

/// Binary layout. Field order is part of the schema.
#[derive(Debug, Serialize, Deserialize)]
struct BinaryIndex {
    digest: u64,
    tokenizer: TokenizerConfig,
    documents: Vec<Document>,
    terms: Vec<(String, Vec<DocId>)>,
    title_terms: Vec<(String, Vec<DocId>)>,
}

/// Serializes `index` in the given format.
pub fn serialize(index: &Index, format: Format) -> Result<Vec<u8>, EncodeError> {
    Ok(match format {
        Format::Json => to_json(index)?.into_bytes(),
        Format::Script => to_script(index)?.into_bytes(),
        Format::Binary => to_binary(index)?,
    })
}

/// Deserializes an index previously produced by [`serialize`] with the same format.
pub fn deserialize(bytes: &[u8], format: Format) -> Result<Index, LoadError> {
    match format {
        Format::Json => from_json(as_text(bytes)?),
        Format::Script => from_script(as_text(bytes)?),
        Format::Binary => from_binary(bytes),
    }
}

fn as_text(bytes: &[u8]) -> Result<&str, LoadError> {
    std::str::from_utf8(bytes).map_err(|e| LoadError::Malformed(e.to_string()))
}

pub fn to_json(index: &Index) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&JsonIndex::from_index(index))?)
}

pub fn from_json(text: &str) -> Result<Index, LoadError> {
    let header: SchemaHeader = serde_json::from_str(text)?;
    check_schema(header.schema)?;
    let blob: JsonIndex = serde_json::from_str(text)?;
    blob.into_index()
}

pub fn to_script(index: &Index) -> Result<String, EncodeError> {
    Ok(format!("{SCRIPT_PREFIX}{}{SCRIPT_SUFFIX}", to_json(index)?))
}

pub fn from_script(text: &str) -> Result<Index, LoadError> {
    let body = text
        .trim()
        .trim_end_matches(';')
        .strip_prefix(SCRIPT_PREFIX)
        .and_then(|rest| rest.strip_suffix(SCRIPT_SUFFIX))
        .ok_or_else(|| {
            LoadError::Malformed(format!("expected a {SCRIPT_PREFIX}...{SCRIPT_SUFFIX} wrapper"))
        })?;
    from_json(body)
}

pub fn to_binary(index: &Index) -> Result<Vec<u8>, EncodeError> {
    let blob = BinaryIndex {
        digest: index.digest().value(),
        tokenizer: index.tokenizer_config().clone(),
        documents: index.documents().to_vec(),
        terms: flatten(index.postings_map()),
        title_terms: flatten(index.title_postings_map()),
    };
    Ok(postcard::to_stdvec(&(SCHEMA_VERSION, blob))?)
}

pub fn from_binary(bytes: &[u8]) -> Result<Index, LoadError> {
    let (schema, rest): (u32, _) = postcard::take_from_bytes(bytes)?;
    check_schema(schema)?;
    let blob: BinaryIndex = postcard::from_bytes(rest)?;

    Index::from_parts(
        blob.documents,
        collect_sorted(blob.terms)?,
        collect_sorted(blob.title_terms)?,
        ContentDigest::new(blob.digest),
        blob.tokenizer,
    )
}

fn flatten(map: &PostingsMap) -> Vec<(String, Vec<DocId>)> {
    map.iter()
        .map(|(term, ids)| (term.clone(), ids.clone()))
        .collect()
}

fn collect_sorted(entries: Vec<(String, Vec<DocId>)>) -> Result<PostingsMap, LoadError> {
    let expected = entries.len();
    let map: PostingsMap = entries.into_iter().collect();
    if map.len() != expected {
        return Err(LoadError::Malformed("duplicate term in binary index".to_string()));
    }
    Ok(map)
}

const fn check_schema(found: u32) -> Result<(), LoadError> {
    if found == SCHEMA_VERSION {
        Ok(())
    } else {
        Err(LoadError::UnsupportedSchema {
            found,
            expected: SCHEMA_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::build;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn sample() -> Index {
        build([
            ("a.md", "A", "fast sparse model"),
            ("b.md", "B", "sparse inference engine"),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(Format::Json)]
    #[case(Format::Script)]
    #[case(Format::Binary)]
    fn test_round_trip(#[case] format: Format) {
        let index = sample();
        let bytes = serialize(&index, format).unwrap();
        let_assert!(Ok(back) = deserialize(&bytes, format));
        check!(back == index);
        check!(back.query("sparse").len() == 2);
    }

    #[test]
    fn test_json_layout() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        check!(value["schema"] == 1);
        check!(value["filenames"] == serde_json::json!(["a.md", "b.md"]));
        check!(value["titles"] == serde_json::json!(["A", "B"]));
        check!(value["terms"]["sparse"] == serde_json::json!([0, 1]));
        check!(value["terms"]["fast"] == 0);
        check!(value["titleterms"]["b"] == 1);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let text = r#"{"schema":1,"filenames":["a.md"],"titles":["A"],
            "terms":{"hello":0},"objects":{},"envversion":{"sphinx":61}}"#;
        let_assert!(Ok(index) = from_json(text));
        check!(index.query("hello").len() == 1);
        check!(index.title_terms().count() == 0);
    }

    #[test]
    fn test_schema_mismatch() {
        let text = r#"{"schema":2,"something":"else"}"#;
        let_assert!(Err(LoadError::UnsupportedSchema { found: 2, expected: 1 }) = from_json(text));
    }

    #[rstest]
    #[case("")]
    #[case("not json")]
    #[case(r#"{"schema":1}"#)]
    #[case(r#"{"schema":1,"filenames":["a"],"titles":["A"],"terms":{"x":"zero"}}"#)]
    fn test_malformed_json(#[case] text: &str) {
        let_assert!(Err(LoadError::Malformed(_)) = from_json(text));
    }

    #[test]
    fn test_document_list_mismatch() {
        let text = r#"{"schema":1,"filenames":["a.md","b.md"],"titles":["A"],"terms":{}}"#;
        let_assert!(
            Err(LoadError::DocumentListMismatch { filenames: 2, titles: 1 }) = from_json(text)
        );
    }

    #[test]
    fn test_out_of_range_json() {
        let text = r#"{"schema":1,"filenames":["a.md"],"titles":["A"],"terms":{"x":[0,3]}}"#;
        let_assert!(Err(LoadError::OrdinalOutOfRange { ordinal: 3, .. }) = from_json(text));
    }

    #[test]
    fn test_script_wrapper() {
        let script = to_script(&sample()).unwrap();
        check!(script.starts_with("Search.setIndex({"));
        check!(script.ends_with("})"));
        let_assert!(Ok(_) = from_script(&format!("{script};\n")));
        let_assert!(Err(LoadError::Malformed(_)) = from_script("{}"));
    }

    #[test]
    fn test_truncated_binary() {
        let bytes = to_binary(&sample()).unwrap();
        let_assert!(Err(LoadError::Malformed(_)) = from_binary(&bytes[..bytes.len() / 2]));
    }

    #[test]
    fn test_binary_schema_mismatch() {
        let bytes = postcard::to_stdvec(&7u32).unwrap();
        let_assert!(Err(LoadError::UnsupportedSchema { found: 7, .. }) = from_binary(&bytes));
    }

    #[rstest]
    #[case("searchindex.json", Format::Json)]
    #[case("searchindex.js", Format::Script)]
    #[case("searchindex.idx", Format::Binary)]
    #[case("searchindex", Format::Binary)]
    fn test_format_from_path(#[case] path: &str, #[case] expected: Format) {
        check!(Format::from_path(Path::new(path)) == expected);
    }
}
