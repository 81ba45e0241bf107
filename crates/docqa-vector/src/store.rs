use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{info, instrument, warn};

use docqa_core::error::Error;
use docqa_core::types::{truncate_chars, ChunkRecord};
use docqa_text::LexicalIndex;

use crate::{sidecar, table, METADATA_FILE, VECTOR_DB_DIR, VECTOR_TABLE};

/// A similarity hit joined with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: f32,
    pub position: usize,
    pub record: ChunkRecord,
}

/// Position-aligned vectors, metadata and lexical index for one index directory.
///
/// `records[i]` always describes `vectors[i]`. The vector file is the
/// authority on count: the sidecar is padded or truncated to match on open.
pub struct VectorStore {
    index_dir: PathBuf,
    dim: usize,
    text_cap: usize,
    vectors: Vec<Vec<f32>>,
    records: Vec<ChunkRecord>,
    lexical: Option<LexicalIndex>,
    runtime: Runtime,
}

impl VectorStore {
    #[instrument(skip_all, fields(index_dir = %index_dir.as_ref().display(), dim = dim))]
    pub fn open(index_dir: impl AsRef<Path>, dim: usize, text_cap: usize) -> Result<Self> {
        let index_dir = index_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&index_dir)?;
        let runtime = Runtime::new()?;

        let db_dir = index_dir.join(VECTOR_DB_DIR);
        table::recover_interrupted_swap(&db_dir)?;
        let vectors = if db_dir.exists() {
            let loaded = runtime.block_on(async {
                let conn = table::open_db(&db_dir).await?;
                table::read_vectors(&conn, VECTOR_TABLE).await
            })?;
            match loaded {
                Some((found, _)) if found != dim => {
                    return Err(Error::DimensionMismatch { expected: dim, found }.into());
                }
                Some((_, vectors)) => vectors,
                None => vec![],
            }
        } else {
            vec![]
        };

        let sidecar_path = index_dir.join(METADATA_FILE);
        let mut records = sidecar::load(&sidecar_path)?;
        if records.len() != vectors.len() {
            warn!(vectors = vectors.len(), records = records.len(), "metadata count differs from vector count; reconciling");
            records.resize_with(vectors.len(), ChunkRecord::default);
            sidecar::rewrite(&sidecar_path, &records)?;
        }

        let mut store = Self { index_dir, dim, text_cap, vectors, records, lexical: None, runtime };
        if !store.records.is_empty() {
            store.rebuild_lexical()?;
        }
        info!(size = store.size(), "opened store");
        Ok(store)
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn size(&self) -> usize { self.vectors.len() }

    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }

    pub fn index_dir(&self) -> &Path { &self.index_dir }

    pub fn records(&self) -> &[ChunkRecord] { &self.records }

    pub fn record(&self, position: usize) -> Option<&ChunkRecord> { self.records.get(position) }

    pub fn has_lexical(&self) -> bool { self.lexical.is_some() }

    /// Append vectors with their records, persist both, rebuild the lexical index.
    ///
    /// Records without a `chunk_id` get a fresh UUID; `text` is capped.
    #[instrument(skip_all, fields(count = vectors.len()))]
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, mut records: Vec<ChunkRecord>) -> Result<()> {
        if vectors.len() != records.len() {
            return Err(Error::LengthMismatch { vectors: vectors.len(), records: records.len() }.into());
        }
        if vectors.is_empty() {
            return Ok(());
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, found: bad.len() }.into());
        }

        for rec in &mut records {
            if !rec.has_chunk_id() {
                rec.chunk_id = Some(uuid::Uuid::new_v4().to_string());
            }
            if rec.text.chars().count() > self.text_cap {
                rec.text = truncate_chars(&rec.text, self.text_cap).to_string();
            }
        }

        // sidecar first; on a failed vector write it is rolled back to the committed records
        sidecar::append(&self.index_dir.join(METADATA_FILE), &records)?;

        let before = self.vectors.len();
        self.vectors.extend(vectors);
        let db_dir = self.index_dir.join(VECTOR_DB_DIR);
        if let Err(e) = self.runtime.block_on(table::rewrite_vectors(&db_dir, VECTOR_TABLE, &self.vectors, self.dim)) {
            self.vectors.truncate(before);
            if let Err(undo) = sidecar::rewrite(&self.index_dir.join(METADATA_FILE), &self.records) {
                warn!(error = %undo, "failed to roll back metadata after vector write error");
            }
            return Err(e);
        }
        self.records.extend(records);
        self.rebuild_lexical()?;
        info!(size = self.size(), added = self.size() - before, "appended to store");
        Ok(())
    }

    /// Up to `k` hits by descending inner product, ties by ascending position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(vec![]);
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, found: query.len() }.into());
        }
        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (dot(v, query), i))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(scored
            .into_iter()
            .take(k)
            .filter_map(|(score, position)| match self.records.get(position) {
                Some(rec) => Some(SearchHit { score, position, record: rec.clone() }),
                None => {
                    warn!(position, "vector hit without metadata; dropped");
                    None
                }
            })
            .collect())
    }

    /// BM25 `(score, position)` pairs; empty when no lexical index is built.
    pub fn lexical_topk(&self, query: &str, k: usize) -> Result<Vec<(f32, usize)>> {
        match &self.lexical {
            Some(index) => index.top_k(query, k),
            None => Ok(vec![]),
        }
    }

    /// Build the lexical index if it is missing and there is text to index.
    pub fn ensure_lexical(&mut self) -> Result<()> {
        if self.lexical.is_none() && !self.records.is_empty() {
            self.rebuild_lexical()?;
        }
        Ok(())
    }

    fn rebuild_lexical(&mut self) -> Result<()> {
        let texts: Vec<&str> = self.records.iter().map(ChunkRecord::passage).collect();
        self.lexical = Some(LexicalIndex::build(&texts)?);
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
