use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, error, info};

use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::DocumentChunk;

use crate::index::{IndexedChunk, SearchableIndex};

const DEFAULT_BATCH_SIZE: usize = 32;

/// Embeds chunks and collects them into a [`SearchableIndex`].
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, batch_size: DEFAULT_BATCH_SIZE, show_progress: false }
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Embed every chunk. Any embedder error, short batch, wrong-sized or
    /// non-finite vector aborts the whole build with [`Error::EmbeddingFailure`].
    pub fn build(&self, chunks: &[DocumentChunk]) -> Result<SearchableIndex> {
        let dim = self.embedder.dim();
        info!(chunks = chunks.len(), embedder = self.embedder.embedder_id(), dim, "building index");

        let pb = if self.show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).map_err(|e| {
                error!(batch = batch_index, error = %e, "embedding batch failed");
                pb.abandon_with_message("embedding failed");
                Error::embedding(format!("batch {batch_index} ({} chunks): {e:#}", batch.len()))
            })?;
            if vectors.len() != batch.len() {
                pb.abandon_with_message("embedding failed");
                return Err(Error::embedding(format!(
                    "batch {batch_index}: embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (chunk, vector) in batch.iter().zip(vectors) {
                if vector.len() != dim {
                    pb.abandon_with_message("embedding failed");
                    return Err(Error::embedding(format!(
                        "chunk {}: expected {dim} dims, got {}",
                        chunk.id,
                        vector.len()
                    )));
                }
                if !vector.iter().all(|x| x.is_finite()) {
                    pb.abandon_with_message("embedding failed");
                    return Err(Error::embedding(format!("chunk {}: vector has non-finite values", chunk.id)));
                }
                entries.push(IndexedChunk { chunk: chunk.clone(), vector });
            }
            pb.inc(batch.len() as u64);
            debug!(batch = batch_index, size = batch.len(), "embedded batch");
        }
        pb.finish_with_message("index ready");
        info!(indexed = entries.len(), "index built");
        Ok(SearchableIndex::new(Arc::clone(&self.embedder), entries))
    }
}

/// Build an index with default batching and no progress bar.
pub fn build(chunks: &[DocumentChunk], embedder: Arc<dyn Embedder>) -> Result<SearchableIndex> {
    IndexBuilder::new(embedder).build(chunks)
}
