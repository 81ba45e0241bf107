use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Document;

const DEFAULT_EXTENSIONS: [&str; 5] = ["txt", "md", "markdown", "csv", "tsv"];

/// Reads plain-text files into [`Document`]s. Title and doc id are the file
/// name; source is `file`.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self { extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect() }
    }
}

impl DocumentLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { extensions: extensions.into_iter().map(|s| s.into().to_lowercase()).collect() }
    }

    /// Load a single file, or every matching file under a directory.
    pub fn load_path(&self, path: &Path) -> Result<Vec<Document>> {
        if path.is_dir() {
            self.load_directory(path)
        } else if path.is_file() {
            Ok(vec![self.load_file(path)?])
        } else {
            Err(Error::NotFound(path.display().to_string()))
        }
    }

    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        let files = self.list_files(dir);
        if files.is_empty() {
            info!(dir = %dir.display(), "no matching files found");
            return Ok(vec![]);
        }
        let mut docs = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            debug!(file = %file.display(), "loading {}/{}", i + 1, files.len());
            docs.push(self.load_file(file)?);
        }
        info!(dir = %dir.display(), files = docs.len(), "loaded documents");
        Ok(docs)
    }

    pub fn load_file(&self, path: &Path) -> Result<Document> {
        let text = read_text(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::NotFound(format!("no file name in {}", path.display())))?;
        Ok(Document::new(name.clone(), name, "file", text))
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.accepts(p))
            .collect();
        files.sort();
        files
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// UTF-8 with a lossy fallback; a leading BOM is dropped.
fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}
