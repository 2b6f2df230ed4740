use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::chunker::{split_with, ChunkingConfig};
use crate::error::{Error, Result};
use crate::types::{Document, DocumentChunk};

/// Loads plain-text documents and cuts them into chunks.
#[derive(Debug, Default, Clone)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Result<Self> {
        chunking_config.validate()?;
        Ok(Self { chunking_config })
    }

    pub fn chunking_config(&self) -> &ChunkingConfig { &self.chunking_config }

    /// Read a single text file in full.
    pub fn load_document(&self, file_path: &Path) -> Result<Document> {
        let content = read_file_content(file_path)?;
        debug!(path = %file_path.display(), chars = content.chars().count(), "loaded document");
        Ok(Document::new(file_path.to_string_lossy(), content))
    }

    /// Load every `.txt` file under `path`, or `path` itself when it is a file.
    pub fn load_documents(&self, path: &Path) -> Result<Vec<Document>> {
        if path.is_file() {
            return Ok(vec![self.load_document(path)?]);
        }
        if !path.is_dir() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let files = list_txt_files(path);
        if files.is_empty() {
            info!(dir = %path.display(), "no .txt files found");
        }
        files
            .iter()
            .map(|f| -> Result<Document> {
                let doc = self.load_document(f)?;
                Ok(Document::with_id(relative_doc_id(path, f), doc.source(), doc.text()))
            })
            .collect()
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<DocumentChunk> {
        split_with(document, &self.chunking_config)
    }

    /// Load and chunk `path` (file or directory) in one go.
    pub fn process_path(&self, path: &Path) -> Result<Vec<DocumentChunk>> {
        let documents = self.load_documents(path)?;
        let mut all_chunks = Vec::new();
        for (file_index, document) in documents.iter().enumerate() {
            let chunks = self.chunk_document(document);
            debug!(file = file_index + 1, of = documents.len(), source = document.source(), chunks = chunks.len(), "chunked document");
            all_chunks.extend(chunks);
        }
        info!(
            files = documents.len(),
            chunks = all_chunks.len(),
            chunk_size = self.chunking_config.chunk_size,
            overlap = self.chunking_config.overlap,
            "processed documents"
        );
        Ok(all_chunks)
    }
}

fn read_file_content(file_path: &Path) -> Result<String> {
    let load_err = |source| Error::DocumentLoad { path: file_path.to_path_buf(), source };
    let bytes = fs::read(file_path).map_err(load_err)?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).to_string()),
    }
}

/// `root/a/notes.txt` becomes `a/notes`, so same-named files in different
/// subdirectories keep distinct ids.
fn relative_doc_id(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}
