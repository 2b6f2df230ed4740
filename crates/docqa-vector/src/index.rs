use std::sync::Arc;
use tracing::debug;

use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::{DocumentChunk, RetrievalResult, ScoredChunk};

use crate::similarity::cosine_similarity;

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

/// Read-only collection of embedded chunks searched by brute-force cosine
/// similarity. Holds the embedder it was built with so queries always land
/// in the same vector space.
pub struct SearchableIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexedChunk>,
}

impl SearchableIndex {
    pub(crate) fn new(embedder: Arc<dyn Embedder>, entries: Vec<IndexedChunk>) -> Self {
        Self { embedder, entries }
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn dim(&self) -> usize { self.embedder.dim() }
    pub fn embedder_id(&self) -> &str { self.embedder.embedder_id() }
    pub fn entries(&self) -> &[IndexedChunk] { &self.entries }

    /// Embed `query` and return the `k` most similar chunks.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::invalid_config("k must be greater than 0"));
        }
        let query_vec = self
            .embedder
            .embed_one(query)
            .map_err(|e| Error::embedding(format!("query: {e:#}")))?;
        if query_vec.len() != self.dim() {
            return Err(Error::embedding(format!("query: expected {} dims, got {}", self.dim(), query_vec.len())));
        }
        if !query_vec.iter().all(|x| x.is_finite()) {
            return Err(Error::embedding("query: vector has non-finite values"));
        }
        Ok(self.search_vec(&query_vec, k))
    }

    /// Rank every stored vector against `query_vec`. Ties keep insertion order.
    pub fn search_vec(&self, query_vec: &[f32], k: usize) -> RetrievalResult {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&e.vector, query_vec)))
            .collect();
        // sort_by is stable, so equal scores stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        debug!(k, returned = scored.len(), top = scored.first().map(|s| s.1), "retrieved chunks");
        RetrievalResult::new(
            scored
                .into_iter()
                .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
                .collect(),
        )
    }
}

/// Free-function form of [`SearchableIndex::retrieve`].
pub fn retrieve(index: &SearchableIndex, query: &str, k: usize) -> Result<RetrievalResult> {
    index.retrieve(query, k)
}
