//! Fixed-width sliding-window chunking over characters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Document, DocumentChunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be greater than 0"));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::invalid_config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// How far the window advances between chunks.
    pub fn stride(&self) -> usize { self.chunk_size - self.overlap }
}

/// Split `document` into windows of `chunk_size` characters that advance by
/// `chunk_size - overlap`. The last window stops at the end of the text, so
/// `"ABCDEFGHIJ"` with (4, 1) yields `ABCD`, `DEFG`, `GHIJ`.
pub fn split(document: &Document, chunk_size: usize, overlap: usize) -> Result<Vec<DocumentChunk>> {
    let config = ChunkingConfig::new(chunk_size, overlap)?;
    Ok(split_with(document, &config))
}

/// Like [`split`] for an already validated config.
pub fn split_with(document: &Document, config: &ChunkingConfig) -> Vec<DocumentChunk> {
    let text = document.text();
    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_len = boundaries.len() - 1;

    let mut windows = Vec::new();
    let mut start = 0usize;
    while start < char_len {
        let end = (start + config.chunk_size).min(char_len);
        windows.push((start, end));
        if end >= char_len { break; }
        start = end - config.overlap;
    }

    let total_chunks = windows.len();
    windows
        .into_iter()
        .enumerate()
        .map(|(chunk_index, (start, end))| DocumentChunk {
            id: format!("{}:{}", document.doc_id(), chunk_index),
            doc_id: document.doc_id().to_string(),
            source: document.source().to_string(),
            content: text[boundaries[start]..boundaries[end]].to_string(),
            chunk_index,
            total_chunks,
            start,
            end,
        })
        .collect()
}

/// Inverse of [`split_with`]: drop the shared prefix of every chunk after the
/// first and concatenate. Chunks must come from one document, in order.
pub fn reassemble(chunks: &[DocumentChunk]) -> String {
    let mut out = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start);
        out.extend(chunk.content.chars().skip(skip));
        covered = covered.max(chunk.end);
    }
    out
}
