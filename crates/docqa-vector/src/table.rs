//! LanceDB access for the vector file.
use anyhow::Result;
use arrow_array::RecordBatchIterator;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::schema::{batch_to_rows, schema_dim, vectors_to_batch};

pub async fn open_db(path: &Path) -> Result<Connection> {
    Ok(connect(path.to_string_lossy().as_ref()).execute().await?)
}

/// All vectors ordered by position, with the table's declared dimension;
/// `None` when the table does not exist.
pub async fn read_vectors(conn: &Connection, name: &str) -> Result<Option<(usize, Vec<Vec<f32>>)>> {
    let names = conn.table_names().execute().await?;
    if !names.contains(&name.to_string()) {
        return Ok(None);
    }
    let table = conn.open_table(name).execute().await?;
    let dim = schema_dim(&*table.schema().await?)?;
    let count = table.count_rows(None).await?;
    let mut rows = Vec::with_capacity(count);
    if count > 0 {
        let mut stream = table.query().limit(count).execute().await?;
        while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
            rows.extend(batch_to_rows(&batch)?);
        }
    }
    rows.sort_by_key(|(position, _)| *position);
    debug!(table = name, rows = rows.len(), dim, "read vector table");
    Ok(Some((dim, rows.into_iter().map(|(_, v)| v).collect())))
}

/// Replace the whole vector file with `vectors`. The new table is built next
/// to the old one and swapped in, so a failed write leaves the old file intact.
pub async fn rewrite_vectors(db_dir: &Path, name: &str, vectors: &[Vec<f32>], dim: usize) -> Result<()> {
    let staging = db_dir.with_extension("lance.tmp");
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;
    if !vectors.is_empty() {
        let conn = open_db(&staging).await?;
        let batch = vectors_to_batch(vectors, dim)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        conn.create_table(name, reader).execute().await?;
    }
    let previous = retired_dir(db_dir);
    if previous.exists() {
        std::fs::remove_dir_all(&previous)?;
    }
    if db_dir.exists() {
        std::fs::rename(db_dir, &previous)?;
    }
    std::fs::rename(&staging, db_dir)?;
    if previous.exists() {
        std::fs::remove_dir_all(&previous)?;
    }
    debug!(table = name, rows = vectors.len(), "rewrote vector table");
    Ok(())
}

/// Put a retired vector file back when a rewrite stopped between its two renames.
pub fn recover_interrupted_swap(db_dir: &Path) -> Result<()> {
    let previous = retired_dir(db_dir);
    if !db_dir.exists() && previous.exists() {
        warn!(dir = %db_dir.display(), "restoring vector file from an interrupted rewrite");
        std::fs::rename(&previous, db_dir)?;
    }
    Ok(())
}

fn retired_dir(db_dir: &Path) -> PathBuf {
    db_dir.with_extension("lance.old")
}
