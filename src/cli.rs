use crate::config::Config;
use crate::corpus::load_corpus;
use crate::error::Result;
use crate::search::{Format, IndexBuilder, SearchHit};
use crate::store::{self, PublishOutcome};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "termdex")]
#[command(about = "Build and query static search indexes for documentation sites", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Index a documentation tree
    Build {
        source: PathBuf,
        /// Output file (default: searchindex.<ext> in the source directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum)]
        format: Option<Format>,
        /// Config file (default: $TERMDEX_CONFIG, ./termdex.toml, user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Search a published index
    Query {
        index: PathBuf,
        #[arg(required = true)]
        text: Vec<String>,
        /// Match titles only
        #[arg(long)]
        titles: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show index metadata
    Info { index: PathBuf },
}

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Build {
            source,
            output,
            format,
            config,
        } => run_build(&source, output, format, config.as_deref()).await,
        Commands::Query {
            index,
            text,
            titles,
            json,
        } => run_query(&index, &text.join(" "), titles, json).await,
        Commands::Info { index } => run_info(&index).await,
    }
}

async fn run_build(
    source: &Path,
    output: Option<PathBuf>,
    format: Option<Format>,
    config: Option<&Path>,
) -> Result<ExitCode> {
    let config = Config::load(config)?;
    let format = format.unwrap_or(config.output.format);
    let output = output
        .unwrap_or_else(|| source.join(format!("searchindex.{}", format.extension())));

    let root = source.to_path_buf();
    let corpus_config = config.corpus.clone();
    let documents = tokio::task::spawn_blocking(move || load_corpus(&root, &corpus_config))
        .await
        .context("Corpus loading task panicked")??;

    let mut builder = IndexBuilder::new(&config.tokenizer);
    builder.extend(documents);

    let skipped = builder.skipped().to_vec();
    let index = builder
        .finalize()
        .with_context(|| format!("Nothing to index under {}", source.display()))?;

    let outcome = store::publish(&index, &output, format).await?;

    let mut summary = format!(
        "Indexed {} documents ({} terms) into {}",
        index.document_count(),
        index.term_count(),
        output.display()
    );
    if outcome == PublishOutcome::Unchanged {
        summary.push_str(" (unchanged)");
    }
    for skip in &skipped {
        let _ = write!(summary, "\n  skipped {}: {}", skip.path, skip.reason);
    }
    println!("{summary}");

    Ok(ExitCode::SUCCESS)
}

async fn run_query(index: &Path, text: &str, titles: bool, json: bool) -> Result<ExitCode> {
    let handle = store::open_handle(index).await;

    let result = if titles {
        handle.search_titles(text)
    } else {
        handle.search(text)
    };

    let hits = match result {
        Ok(hits) => hits,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::from(2));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        println!("{}", format_hits(text, &hits));
    }

    Ok(ExitCode::SUCCESS)
}

fn format_hits(text: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{text}'");
    }

    let mut out = String::new();
    for hit in hits {
        let _ = writeln!(out, "{} ({})", hit.title, hit.path);
    }
    out.trim_end().to_string()
}

async fn run_info(index: &Path) -> Result<ExitCode> {
    let loaded = store::load(index)
        .await
        .with_context(|| format!("Failed to load index {}", index.display()))?;

    println!(
        "schema:    {}\ndigest:    {}\ndocuments: {}\nterms:     {}\ntitles:    {}",
        crate::search::SCHEMA_VERSION,
        loaded.digest(),
        loaded.document_count(),
        loaded.term_count(),
        loaded.title_terms().count()
    );

    Ok(ExitCode::SUCCESS)
}
