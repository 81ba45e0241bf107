//! Domain types shared by the chunker, the store and the retriever.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Open extension fields carried alongside the required metadata.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// A raw document handed to the chunker. Consumed entirely by chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(
        doc_id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self { doc_id: doc_id.into(), title: title.into(), source: source.into(), text: text.into() }
    }
}

/// A bounded unit of a document that is independently embedded and indexed.
///
/// - `id`: `"{doc_id}:{index}"`, unique within one document
/// - `section`: the last heading seen, or `rows a-b` for tabular chunks
/// - `row_range`: `a-b` for tabular chunks only
/// - `text`: prefixed, capped chunk body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub title: String,
    pub section: String,
    pub row_range: Option<String>,
    pub text: String,
}

impl Chunk {
    pub fn is_tabular(&self) -> bool {
        self.row_range.is_some()
    }
}

/// Persisted metadata describing the vector at the same position.
///
/// Every field defaults so that padding records and partial sidecar lines
/// still deserialize. Unknown keys land in `extra` and are written back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkRecord {
    pub doc_id: String,
    pub source: String,
    pub title: String,
    pub section: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<ChunkId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_range: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ChunkRecord {
    /// Text used for lexical indexing and passage scoring: `text`, falling
    /// back to a `snippet` extension field.
    pub fn passage(&self) -> &str {
        if !self.text.trim().is_empty() {
            return &self.text;
        }
        self.extra.get("snippet").and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn has_chunk_id(&self) -> bool {
        self.chunk_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// `chunk.id` is only unique within one document, so it is not carried over;
/// the store assigns a fresh `chunk_id` on add.
impl From<Chunk> for ChunkRecord {
    fn from(chunk: Chunk) -> Self {
        Self {
            doc_id: chunk.doc_id,
            source: chunk.source,
            title: chunk.title,
            section: chunk.section,
            text: chunk.text,
            chunk_id: None,
            row_range: chunk.row_range,
            extra: Extra::new(),
        }
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
