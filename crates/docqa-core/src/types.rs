//! Domain types shared by the chunker, the index and the answerer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub type ChunkId = String;

/// A loaded source document. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    doc_id: String,
    source: String,
    text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let source = source.into();
        let doc_id = Path::new(&source)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| source.clone());
        Self { doc_id, source, text: text.into() }
    }

    /// Use an explicit id instead of the file stem, e.g. a path relative to
    /// the directory the document was loaded from.
    pub fn with_id(doc_id: impl Into<String>, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self { doc_id: doc_id.into(), source: source.into(), text: text.into() }
    }

    pub fn doc_id(&self) -> &str { &self.doc_id }
    pub fn source(&self) -> &str { &self.source }
    pub fn text(&self) -> &str { &self.text }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize { self.text.chars().count() }
}

/// A contiguous, overlapping slice of a [`Document`] used as the unit of retrieval.
///
/// - `id`: `"{doc_id}:{chunk_index}"`, unique as long as doc ids are
/// - `doc_id`/`source`: identity of the parent document
/// - `content`: the chunk text
/// - `chunk_index`/`total_chunks`: position within the parent document
/// - `start`/`end`: character offsets into the parent text, `end` exclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub start: usize,
    pub end: usize,
}

/// One retrieved chunk with its similarity to the query. Higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Top-k hits for one query, sorted by descending score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Callers are expected to pass hits already sorted by descending score.
    pub fn new(hits: Vec<ScoredChunk>) -> Self { Self { hits } }

    pub fn hits(&self) -> &[ScoredChunk] { &self.hits }
    pub fn len(&self) -> usize { self.hits.len() }
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|h| h.chunk.content.as_str())
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;
    fn into_iter(self) -> Self::IntoIter { self.hits.into_iter() }
}

/// Which path through the answerer produced an [`Answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKind {
    Generated,
    NoAnswer,
    Unprocessable,
}

/// Sanitized text handed back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    text: String,
    kind: AnswerKind,
}

impl Answer {
    pub fn new(text: impl Into<String>, kind: AnswerKind) -> Self {
        Self { text: text.into(), kind }
    }

    pub fn text(&self) -> &str { &self.text }
    pub fn kind(&self) -> AnswerKind { self.kind }
    pub fn is_fallback(&self) -> bool { self.kind != AnswerKind::Generated }
    pub fn into_text(self) -> String { self.text }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.text) }
}

/// Raw output of a generation call before sanitization.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Text(String),
    /// Anything the model returned that is not plain text, e.g. an error object.
    Structured(serde_json::Value),
}
