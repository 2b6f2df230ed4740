//! Chat completions from any OpenAI-compatible `/chat/completions` endpoint.
//!
//! Owns a current-thread tokio runtime and blocks on each request, so it must
//! not be called from inside another async runtime.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use docqa_core::config::GenerationSettings;
use docqa_core::traits::Generator;
use docqa_core::types::GenerationOutput;

pub struct ChatCompletionsGenerator {
    rt: Runtime,
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl ChatCompletionsGenerator {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let client = reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout_secs)).build()?;
        Ok(Self {
            rt,
            client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: std::env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty()),
            model: settings.model.clone(),
            system_prompt: settings.system_prompt.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    async fn request(&self, prompt: &str) -> Result<GenerationOutput> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage { role: "system", content: &self.system_prompt });
        }
        messages.push(ChatMessage { role: "user", content: prompt });
        let body = ChatRequest { model: &self.model, messages, temperature: self.temperature, max_tokens: self.max_tokens };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.with_context(|| format!("chat request to {} failed", self.endpoint))?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, endpoint = %self.endpoint, "chat API returned an error status");
            // A JSON error object is still a model response, just not text.
            return match serde_json::from_str::<Value>(&text) {
                Ok(value) => Ok(GenerationOutput::Structured(value)),
                Err(_) => bail!("chat API returned {status}: {text}"),
            };
        }
        parse_chat_completion(&text)
    }
}

/// Pull `choices[0].message.content` out of a response body. Any other shape
/// comes back as [`GenerationOutput::Structured`].
pub fn parse_chat_completion(body: &str) -> Result<GenerationOutput> {
    let value: Value = serde_json::from_str(body).context("failed to parse chat response")?;
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(match content {
        Some(text) => GenerationOutput::Text(text),
        None => GenerationOutput::Structured(value),
    })
}

impl Generator for ChatCompletionsGenerator {
    fn model_id(&self) -> &str { &self.model }

    fn generate(&self, prompt: &str) -> Result<GenerationOutput> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        self.rt.block_on(self.request(prompt))
    }
}
