use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Padding token id used by XLM-RoBERTa vocabularies.
const PAD_ID: u32 = 1;

/// Encode `text`, truncating or padding to exactly `max_len` tokens.
/// Returns `(input_ids, attention_mask)`, each shaped `[1, max_len]`.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    ids.resize(max_len, PAD_ID);
    mask.resize(max_len, 0);
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}
