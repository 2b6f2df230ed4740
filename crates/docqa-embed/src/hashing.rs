//! Deterministic feature-hashing embedder.
//!
//! Needs no model files or network, which makes it the default for tests and
//! local development. Texts sharing words land near each other; there is no
//! semantic understanding beyond that.

use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use docqa_core::traits::Embedder;

pub struct HashingEmbedder {
    dim: usize,
    id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), id: format!("hashing:xxh64:d{}", dim.max(1)) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let magnitude = 0.5 + ((h >> 32) as u32 as f32) / (u32::MAX as f32);
            let sign = if h & (1 << 31) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign * magnitude;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-6 {
            for x in &mut v { *x /= norm; }
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
