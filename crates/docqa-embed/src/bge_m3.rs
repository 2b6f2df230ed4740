use anyhow::{anyhow, ensure, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use docqa_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

pub const BGE_M3_DIM: usize = 1024;

/// Dense BGE-M3 embeddings computed locally with candle.
pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    id: String,
}

impl BgeM3Embedder {
    /// Load tokenizer, config and weights from `model_dir`, or from the first
    /// directory found by [`resolve_model_dir`] when `None`.
    pub fn new(model_dir: Option<&Path>, max_len: usize) -> Result<Self> {
        let device = select_device();
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => resolve_model_dir()?,
        };
        info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights = load_weights(&model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, max_len, id: format!("bge-m3:d{BGE_M3_DIM}:t{max_len}") })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let hidden_states = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden_states, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        ensure!(emb.len() == BGE_M3_DIM, "expected {} dims, model produced {}", BGE_M3_DIM, emb.len());
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            warn!(ms = elapsed.as_millis() as u64, "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for BgeM3Embedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { BGE_M3_DIM }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(batch = texts.len(), "embedding batch with BGE-M3");
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pickle)?;
    Ok(weights.into_iter().collect())
}

/// Look for the model under `APP_MODEL_DIR`, `MODEL_DIR`, then the
/// conventional `models/bge-m3` locations.
pub fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() { return Ok(p); }
        }
    }
    ["../models/bge-m3", "models/bge-m3"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Could not locate BGE-M3 model directory"))
}
