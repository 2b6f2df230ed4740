//! docqa-embed
//!
//! Embedding backends behind [`docqa_core::traits::Embedder`]: a deterministic
//! hashing embedder, local BGE-M3 through candle, and a remote
//! OpenAI-compatible client. [`build_embedder`] picks one from settings.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use docqa_core::config::{expand_path, EmbeddingProvider, EmbeddingSettings};
use docqa_core::traits::Embedder;

pub mod bge_m3;
pub mod device;
pub mod hashing;
pub mod pool;
pub mod remote;
pub mod tokenize;

pub use bge_m3::BgeM3Embedder;
pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use remote::RemoteEmbedder;

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(settings.dim)),
        EmbeddingProvider::BgeM3 => {
            let dir = settings.model_dir.as_deref().map(expand_path);
            Arc::new(BgeM3Embedder::new(dir.as_deref(), settings.max_len)?)
        }
        EmbeddingProvider::Openai => Arc::new(RemoteEmbedder::from_settings(settings)?),
    };
    info!(embedder = embedder.embedder_id(), dim = embedder.dim(), "embedder ready");
    Ok(embedder)
}
