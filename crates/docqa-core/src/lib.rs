//! docqa-core
//!
//! Domain types, error taxonomy, configuration, collaborator traits and the
//! chunker shared by every other `docqa` crate.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{split, ChunkingConfig};
pub use error::{Error, Result};
pub use traits::{Embedder, Generator};
pub use types::{Answer, AnswerKind, Document, DocumentChunk, GenerationOutput, RetrievalResult, ScoredChunk};
