use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad chunking, retrieval or answering parameters. Fatal to the call.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding collaborator failed; no partial index is kept.
    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Failed to load document {path}: {source}")]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingFailure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
