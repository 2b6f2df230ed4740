//! docqa-pipeline
//!
//! [`QaPipeline`] wires chunking, indexing, retrieval and answering behind a
//! single `ask(&str) -> Answer` call. The index is built once and only read
//! afterwards, so one pipeline can serve concurrent callers through an `Arc`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use docqa_answer::{Answerer, ChatCompletionsGenerator, UNPROCESSABLE_MESSAGE};
use docqa_core::config::Settings;
use docqa_core::data_processor::DataProcessor;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, Generator};
use docqa_core::types::{Answer, AnswerKind, Document, DocumentChunk, RetrievalResult};
use docqa_vector::{IndexBuilder, SearchableIndex};

pub struct QaPipeline {
    index: SearchableIndex,
    answerer: Answerer,
    top_k: usize,
}

impl QaPipeline {
    pub fn new(index: SearchableIndex, answerer: Answerer, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::invalid_config("top_k must be greater than 0"));
        }
        Ok(Self { index, answerer, top_k })
    }

    /// Chunk and index already-loaded documents with explicit collaborators.
    pub fn from_documents(
        documents: &[Document],
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        settings.validate()?;
        let processor = DataProcessor::with_config(settings.chunking)?;
        let chunks: Vec<DocumentChunk> = documents.iter().flat_map(|d| processor.chunk_document(d)).collect();
        Self::from_chunks(&chunks, settings, embedder, generator)
    }

    pub fn from_chunks(
        chunks: &[DocumentChunk],
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        settings.validate()?;
        let start = Instant::now();
        let index = IndexBuilder::new(embedder)
            .batch_size(settings.embedding.batch_size)
            .show_progress(settings.embedding.show_progress)
            .build(chunks)?;
        let answerer = Answerer::from_settings(&settings.answer, generator)?;
        info!(chunks = index.len(), ms = start.elapsed().as_millis() as u64, "pipeline ready");
        Self::new(index, answerer, settings.retrieval.top_k)
    }

    /// Load `path` (file or directory of `.txt` files) and build every
    /// collaborator from `settings`.
    pub fn open(path: &Path, settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let documents = DataProcessor::with_config(settings.chunking)?.load_documents(path)?;
        let embedder = docqa_embed::build_embedder(&settings.embedding)?;
        let generator: Arc<dyn Generator> = Arc::new(ChatCompletionsGenerator::from_settings(&settings.generation)?);
        Ok(Self::from_documents(&documents, settings, embedder, generator)?)
    }

    pub fn index(&self) -> &SearchableIndex { &self.index }
    pub fn top_k(&self) -> usize { self.top_k }

    pub fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        self.index.retrieve(query, self.top_k)
    }

    /// Answer one question. Stateless and infallible: a failed query
    /// embedding degrades to the "could not process" fallback.
    pub fn ask(&self, query: &str) -> Answer {
        let start = Instant::now();
        let retrieved = match self.retrieve(query) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                return Answer::new(UNPROCESSABLE_MESSAGE, AnswerKind::Unprocessable);
            }
        };
        let answer = self.answerer.answer(query, &retrieved);
        info!(
            hits = retrieved.len(),
            kind = ?answer.kind(),
            ms = start.elapsed().as_millis() as u64,
            "answered query"
        );
        answer
    }
}
