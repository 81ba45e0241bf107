//! docqa CLI: ingest documents into a local index and ask questions over it.
//!
//! ```bash
//! docqa ingest ./notes ./faq.md
//! docqa ingest-text --text "Paris is the capital of France." --title Geo
//! docqa query "What is the capital of France?" --top-k 3
//! docqa status --json
//! ```

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{resolve_with_base, Config, Settings};
use docqa_core::loader::DocumentLoader;
use docqa_embed::{get_default_embedder, get_default_reranker};
use docqa_hybrid::{HybridEngine, IngestRequest, QueryRequest};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Local document question answering")]
struct Cli {
    /// Directory holding config.toml / config.<env>.toml
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Override storage.index_dir
    #[arg(long, global = true)]
    index_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files or directories (.txt, .md, .csv, .tsv)
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ingest inline text
    IngestText {
        #[arg(long = "text", required = true)]
        texts: Vec<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        doc_id: Option<String>,
        #[arg(long)]
        source: Option<String>,
    },
    /// Answer a question from the index
    Query {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Allow small-talk replies
        #[arg(long)]
        no_strict: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show index location and size
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(&cli)?;
    info!(index_dir = %settings.storage.index_dir, "using index");

    match cli.command {
        Command::Ingest { paths } => {
            let loader = DocumentLoader::new();
            let mut docs = Vec::new();
            for path in &paths {
                docs.extend(loader.load_path(path).with_context(|| format!("loading {}", path.display()))?);
            }
            let mut engine = open_engine(&settings)?;
            let spinner = spinner(format!("Embedding {} documents", docs.len()));
            let report = engine.ingest_documents(&docs)?;
            spinner.finish_and_clear();
            println!("{}", output::format_ingest(&report));
        }
        Command::IngestText { texts, title, doc_id, source } => {
            let mut engine = open_engine(&settings)?;
            let report = engine.ingest_texts(IngestRequest { texts, doc_id, source, title })?;
            println!("{}", output::format_ingest(&report));
        }
        Command::Query { query, top_k, no_strict, json } => {
            let mut engine = open_engine(&settings)?;
            let response = engine.query(QueryRequest { query, top_k, strict: !no_strict });
            let rendered = if json { serde_json::to_string_pretty(&response)? } else { output::format_answer(&response) };
            println!("{}", rendered);
        }
        Command::Status { json } => {
            let engine = open_engine(&settings)?;
            let status = output::Status::from_engine(&engine);
            let rendered = if json { serde_json::to_string_pretty(&status)? } else { output::format_status(&status) };
            println!("{}", rendered);
        }
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let config = Config::load_from(&cli.config_dir)?;
    let mut settings = config.settings()?;
    let index_dir = cli.index_dir.clone().unwrap_or_else(|| settings.storage.index_dir.clone());
    settings.storage.index_dir = resolve_with_base(&cli.config_dir, index_dir).to_string_lossy().to_string();
    Ok(settings)
}

fn open_engine(settings: &Settings) -> Result<HybridEngine> {
    let embedder = get_default_embedder(&settings.models)?;
    let reranker = get_default_reranker(&settings.models)?;
    HybridEngine::open(settings, embedder, reranker)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
