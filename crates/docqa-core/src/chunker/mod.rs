//! Structure-aware chunker.
//!
//! Lines are classified (see [`classify`]) and assembled in one of two modes:
//! prose, where sentences accumulate up to a token budget with a trailing
//! sentence overlap, and rows, entered when at least half of the last
//! [`ROW_WINDOW`] lines look tabular, where rows are grouped [`ROWS_PER_CHUNK`] at
//! a time with a [`ROW_OVERLAP`]-row overlap. Every chunk carries a
//! `Title > Section` prefix.

pub mod classify;
pub mod normalize;
pub mod sentence;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use tracing::debug;

use crate::config::ChunkingSettings;
use crate::types::{truncate_chars, Chunk, Document};

pub use classify::{classify, LineKind};
pub use normalize::normalize_text;
pub use sentence::{approx_tokens, split_sentences, SentenceBoundary};

pub const ROW_WINDOW: usize = 20;
pub const ROWS_PER_CHUNK: usize = 30;
pub const ROW_OVERLAP: usize = 5;
pub const MIN_ALPHA_TOKENS: usize = 5;

static ALPHA_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{2,}").expect("valid alpha regex"));

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    settings: ChunkingSettings,
}

impl Chunker {
    pub fn new(settings: ChunkingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ChunkingSettings {
        &self.settings
    }

    /// Chunk text under `title`, using the title as doc id and `file` as source.
    pub fn chunk_text(&self, text: &str, title: &str) -> Vec<Chunk> {
        self.chunk_document(&Document::new(title, title, "file", text))
    }

    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let normalized = normalize_text(&doc.text);
        let mut assembly = Assembly::new(&self.settings, &doc.title);
        let mut window: VecDeque<bool> = VecDeque::with_capacity(ROW_WINDOW + 1);

        for line in normalized.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let kind = classify(line);
            window.push_back(kind.is_row());
            if window.len() > ROW_WINDOW {
                window.pop_front();
            }
            let delimiter = match kind {
                LineKind::Heading(heading) => {
                    assembly.section = Some(heading);
                    continue;
                }
                LineKind::Row { delimiter } => delimiter,
                LineKind::KeyValue => {
                    if !in_row_mode(&window) {
                        assembly.push_sentence(line.to_string());
                        continue;
                    }
                    ','
                }
                LineKind::Plain => ',',
            };
            if in_row_mode(&window) {
                assembly.flush_prose();
                assembly.push_row(line, delimiter);
            } else {
                for s in split_sentences(line, SentenceBoundary::Capitalized) {
                    assembly.push_sentence(s);
                }
            }
        }
        assembly.flush_rows();
        assembly.flush_prose();

        let drafts = assembly.finish();
        let before = drafts.len();
        let chunks: Vec<Chunk> = drafts
            .into_iter()
            .filter(|d| ALPHA_TOKEN.find_iter(&d.text).count() >= MIN_ALPHA_TOKENS)
            .enumerate()
            .map(|(i, d)| Chunk {
                id: format!("{}:{}", doc.doc_id, i),
                doc_id: doc.doc_id.clone(),
                source: doc.source.clone(),
                title: doc.title.clone(),
                section: d.section,
                row_range: d.row_range,
                text: d.text,
            })
            .collect();
        debug!(doc_id = %doc.doc_id, kept = chunks.len(), dropped = before - chunks.len(), "chunked document");
        chunks
    }
}

fn in_row_mode(window: &VecDeque<bool>) -> bool {
    let rows = window.iter().filter(|r| **r).count();
    !window.is_empty() && rows * 2 >= window.len()
}

fn prefix(title: &str, section: Option<&str>) -> String {
    match (title.is_empty(), section) {
        (false, Some(section)) => format!("{} > {}\n", title, section),
        (false, None) => format!("{}\n", title),
        (true, _) => String::new(),
    }
}

struct Draft {
    text: String,
    section: String,
    row_range: Option<String>,
}

/// Mutable state for one `chunk_document` call.
struct Assembly<'a> {
    settings: &'a ChunkingSettings,
    title: &'a str,
    section: Option<String>,
    sentences: Vec<String>,
    tokens: usize,
    // sentences added since the last flush; the overlap seed does not count
    fresh_sentences: usize,
    rows: Vec<String>,
    row_start: usize,
    fresh_rows: usize,
    out: Vec<Draft>,
}

impl<'a> Assembly<'a> {
    fn new(settings: &'a ChunkingSettings, title: &'a str) -> Self {
        Self {
            settings,
            title,
            section: None,
            sentences: Vec::new(),
            tokens: 0,
            fresh_sentences: 0,
            rows: Vec::new(),
            row_start: 1,
            fresh_rows: 0,
            out: Vec::new(),
        }
    }

    fn push_sentence(&mut self, sentence: String) {
        let cost = approx_tokens(&sentence);
        if self.fresh_sentences > 0 && self.tokens + cost > self.settings.target_tokens {
            self.flush_prose();
        }
        self.tokens += cost;
        self.sentences.push(sentence);
        self.fresh_sentences += 1;
    }

    fn push_row(&mut self, line: &str, delimiter: char) {
        let row = line
            .split(delimiter)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ; ");
        self.rows.push(row);
        self.fresh_rows += 1;
        if self.rows.len() >= ROWS_PER_CHUNK {
            self.flush_rows();
        }
    }

    fn flush_prose(&mut self) {
        if self.fresh_sentences == 0 {
            return;
        }
        let body = self.sentences.join(" ");
        let text = format!("{}{}", prefix(self.title, self.section.as_deref()), body);
        self.out.push(Draft {
            text: truncate_chars(&text, self.settings.max_chars).to_string(),
            section: self.section.clone().unwrap_or_default(),
            row_range: None,
        });

        // keep trailing sentences strictly under the overlap budget
        let mut keep = 0;
        let mut carried = 0;
        for s in self.sentences.iter().rev() {
            let cost = approx_tokens(s);
            if carried + cost >= self.settings.overlap_tokens {
                break;
            }
            carried += cost;
            keep += 1;
        }
        let split = self.sentences.len() - keep;
        self.sentences.drain(..split);
        self.tokens = carried;
        self.fresh_sentences = 0;
    }

    fn flush_rows(&mut self) {
        if self.fresh_rows == 0 {
            return;
        }
        let row_end = self.row_start + self.rows.len() - 1;
        let range = format!("{}-{}", self.row_start, row_end);
        let text = format!("{} > {}\n{}", self.title, self.section.as_deref().unwrap_or("rows"), self.rows.join("\n"));
        self.out.push(Draft {
            text: truncate_chars(&text, self.settings.max_chars).to_string(),
            section: format!("rows {}", range),
            row_range: Some(range),
        });

        let keep = self.rows.len().min(ROW_OVERLAP);
        let split = self.rows.len() - keep;
        self.rows.drain(..split);
        self.row_start = row_end + 1 - keep;
        self.fresh_rows = 0;
    }

    fn finish(self) -> Vec<Draft> {
        self.out
    }
}
