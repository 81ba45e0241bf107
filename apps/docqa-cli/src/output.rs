//! Human-readable rendering; `--json` output serializes the engine types directly.

use serde::Serialize;

use docqa_hybrid::{HybridEngine, IngestReport, QueryResponse};

const SNIPPET_MAX_LEN: usize = 160;

#[derive(Serialize)]
pub struct Status {
    pub index_dir: String,
    pub index_size: usize,
    pub dim: usize,
    pub lexical_ready: bool,
}

impl Status {
    pub fn from_engine(engine: &HybridEngine) -> Self {
        let store = engine.store();
        Self {
            index_dir: store.index_dir().display().to_string(),
            index_size: store.size(),
            dim: store.dim(),
            lexical_ready: store.has_lexical(),
        }
    }
}

pub fn format_ingest(report: &IngestReport) -> String {
    format!("Ingested {} chunks (index size {})", report.ingested_chunks, report.index_size)
}

pub fn format_status(status: &Status) -> String {
    format!(
        "index: {}\nchunks: {}\ndimension: {}\nlexical index: {}",
        status.index_dir,
        status.index_size,
        status.dim,
        if status.lexical_ready { "ready" } else { "empty" }
    )
}

pub fn format_answer(response: &QueryResponse) -> String {
    let mut out = response.answer.clone();
    if response.sources.is_empty() {
        return out;
    }
    out.push_str("\n\nSources:");
    for source in &response.sources {
        let record = &source.record;
        let mut label = record.title.clone();
        if !record.section.is_empty() {
            label.push_str(" > ");
            label.push_str(&record.section);
        }
        let marker = if source.cited { "*" } else { " " };
        out.push_str(&format!("\n{}[{}] {} ({})", marker, source.rank, label, record.doc_id));
        let snippet = one_line(&source.snippet);
        if !snippet.is_empty() {
            out.push_str(&format!("\n     {}", snippet));
        }
    }
    out
}

fn one_line(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(SNIPPET_MAX_LEN) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
