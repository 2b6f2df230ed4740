//! Embeddings from any OpenAI-compatible `/embeddings` endpoint.
//!
//! The client owns a current-thread tokio runtime and blocks on each request,
//! so it must not be called from inside another async runtime.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, error};

use docqa_core::config::EmbeddingSettings;
use docqa_core::traits::Embedder;

pub struct RemoteEmbedder {
    rt: Runtime,
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dim: usize,
    max_len: usize,
    id: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl RemoteEmbedder {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, dim: usize, timeout: Duration) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            rt,
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.to_string(),
            dim,
            max_len: 8192,
            id: format!("openai:{model}:d{dim}"),
        })
    }

    /// Build from settings, reading the API key from `settings.api_key_env`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env).ok();
        Self::new(&settings.base_url, &settings.model, api_key, settings.dim, Duration::from_secs(settings.timeout_secs))
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut req = self.client.post(&self.endpoint).json(&EmbeddingRequest { model: &self.model, input: texts });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.with_context(|| format!("embedding request to {} failed", self.endpoint))?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
            error!(%status, endpoint = %self.endpoint, "embedding API error");
            bail!("embedding API returned {status}: {detail}");
        }
        parse_embeddings(&body, texts.len(), self.dim)
    }
}

/// Decode an `/embeddings` response body, restoring input order and checking
/// the count and dimension of every vector.
pub fn parse_embeddings(body: &str, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body).context("failed to parse embedding response")?;
    if parsed.data.len() != expected {
        bail!("embedding API returned {} vectors for {} inputs", parsed.data.len(), expected);
    }
    parsed.data.sort_by_key(|d| d.index);
    parsed
        .data
        .into_iter()
        .map(|d| {
            if d.embedding.len() == dim {
                Ok(d.embedding)
            } else {
                Err(anyhow!("embedding API returned {} dims, expected {}", d.embedding.len(), dim))
            }
        })
        .collect()
}

impl Embedder for RemoteEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        debug!(batch = texts.len(), model = %self.model, "requesting embeddings");
        self.rt.block_on(self.request(texts))
    }
}
