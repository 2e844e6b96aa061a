mod common;

use assert2::{check, let_assert};
use common::{TempWorkspace, sample_documents};
use rstest::rstest;
use termdex::config::TokenizerConfig;
use termdex::search::build_with;
use termdex::store::{self, PublishOutcome};
use termdex::{Format, LoadError, SourceDocument, build};

#[rstest]
#[case("searchindex.json", Format::Json)]
#[case("_static/searchindex.js", Format::Script)]
#[case("searchindex.idx", Format::Binary)]
#[tokio::test(flavor = "multi_thread")]
async fn save_then_load(
    sample_documents: Vec<SourceDocument>,
    #[case] name: &str,
    #[case] format: Format,
) {
    let workspace = TempWorkspace::new();
    let path = workspace.join(name);
    let index = build(sample_documents).unwrap();

    store::save(&index, &path, format).await.unwrap();
    check!(path.exists());
    check!(!workspace.join(&format!("{name}.tmp")).exists());

    let_assert!(Ok(loaded) = store::load(&path).await);
    check!(loaded == index);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_skips_unchanged_content(sample_documents: Vec<SourceDocument>) {
    let workspace = TempWorkspace::new();
    let path = workspace.join("searchindex.json");
    let index = build(sample_documents.clone()).unwrap();

    let_assert!(Ok(PublishOutcome::Written) = store::publish(&index, &path, Format::Json).await);

    let rebuilt = build(sample_documents).unwrap();
    let_assert!(Ok(PublishOutcome::Unchanged) = store::publish(&rebuilt, &path, Format::Json).await);

    let changed = build([("a.md", "A", "dense model")]).unwrap();
    let_assert!(Ok(PublishOutcome::Written) = store::publish(&changed, &path, Format::Json).await);
    let_assert!(Ok(loaded) = store::load(&path).await);
    check!(loaded.query("dense").len() == 1);
    check!(loaded.query("sparse").is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_rewrites_when_tokenizer_settings_change() {
    let workspace = TempWorkspace::new();
    let path = workspace.join("searchindex.json");
    let corpus = vec![SourceDocument::new("a.md", "A", "the sparse model")];

    let index = build(corpus.clone()).unwrap();
    let_assert!(Ok(PublishOutcome::Written) = store::publish(&index, &path, Format::Json).await);

    let config = TokenizerConfig {
        stop_words: vec!["the".to_string()],
        ..TokenizerConfig::default()
    };
    let rebuilt = build_with(corpus, &config).unwrap();
    check!(rebuilt.digest() != index.digest());
    let_assert!(Ok(PublishOutcome::Written) = store::publish(&rebuilt, &path, Format::Json).await);

    let_assert!(Ok(loaded) = store::load(&path).await);
    check!(loaded.tokenizer_config() == &config);
    check!(loaded.postings("the").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_overwrites_corrupt_file(sample_documents: Vec<SourceDocument>) {
    let workspace = TempWorkspace::new();
    workspace.create_file("searchindex.json", "{ not an index");
    let path = workspace.join("searchindex.json");
    let index = build(sample_documents).unwrap();

    let_assert!(Ok(PublishOutcome::Written) = store::publish(&index, &path, Format::Json).await);
    let_assert!(Ok(_) = store::load(&path).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn load_missing_file_is_io_error() {
    let workspace = TempWorkspace::new();
    let_assert!(Err(LoadError::Io { .. }) = store::load(&workspace.join("missing.json")).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn corrupt_index_gives_unavailable_handle() {
    let workspace = TempWorkspace::new();
    workspace.create_file("searchindex.js", "Search.setIndex({\"schema\":1})");

    let handle = store::open_handle(&workspace.join("searchindex.js")).await;
    check!(!handle.is_available());
    let_assert!(Err(e) = handle.search("sparse"));
    check!(e.reason.contains("malformed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn newer_schema_gives_unavailable_handle() {
    let workspace = TempWorkspace::new();
    workspace.create_file("searchindex.json", r#"{"schema":99,"layout":"future"}"#);

    let handle = store::open_handle(&workspace.join("searchindex.json")).await;
    let_assert!(Err(e) = handle.search("sparse"));
    check!(e.reason.contains("unsupported index schema 99"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn handle_from_published_index(sample_documents: Vec<SourceDocument>) {
    let workspace = TempWorkspace::new();
    let path = workspace.join("searchindex.idx");
    store::save(&build(sample_documents).unwrap(), &path, Format::Binary)
        .await
        .unwrap();

    let handle = store::open_handle(&path).await;
    let_assert!(Ok(hits) = handle.search("fast"));
    check!(hits.len() == 1);
    check!(hits[0].title == "A");
}
