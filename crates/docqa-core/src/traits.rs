use crate::types::GenerationOutput;

/// Turns text into fixed-dimension vectors. Implementations must be
/// deterministic for a fixed `embedder_id`.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hashing:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// A generative language model reached through some client.
pub trait Generator: Send + Sync {
    fn model_id(&self) -> &str;
    fn generate(&self, prompt: &str) -> anyhow::Result<GenerationOutput>;
}
