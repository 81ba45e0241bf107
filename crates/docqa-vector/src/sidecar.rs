//! Append-only JSON-lines metadata, one record per vector position.
use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

use docqa_core::types::ChunkRecord;

/// Parse every line; blank and malformed lines are skipped with a warning.
/// Invalid UTF-8 is decoded lossily rather than failing the whole file.
pub fn load(path: &Path) -> Result<Vec<ChunkRecord>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (n, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!(file = %path.display(), line = n + 1, "metadata record is not valid UTF-8; decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ChunkRecord>(line.trim()) {
            Ok(rec) => records.push(rec),
            Err(e) => warn!(file = %path.display(), line = n + 1, error = %e, "skipping malformed metadata record"),
        }
    }
    Ok(records)
}

pub fn append(path: &Path, records: &[ChunkRecord]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Replace the sidecar contents atomically.
pub fn rewrite(path: &Path, records: &[ChunkRecord]) -> Result<()> {
    let tmp = path.with_extension("jsonl.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        write_records(&mut writer, records)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_records<W: Write>(writer: &mut W, records: &[ChunkRecord]) -> Result<()> {
    for rec in records {
        serde_json::to_writer(&mut *writer, rec)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
