use std::sync::Arc;
use tracing::{debug, warn};

use docqa_core::config::AnswerSettings;
use docqa_core::error::Result;
use docqa_core::traits::Generator;
use docqa_core::types::{Answer, AnswerKind, GenerationOutput, RetrievalResult};

use crate::prompt::PromptTemplate;
use crate::sanitizer::ArtifactSanitizer;

/// Returned when the model produced nothing once artifacts were removed.
pub const NO_ANSWER_MESSAGE: &str = "I couldn't find an answer to that question in the document.";
/// Returned when the model call failed or did not produce text.
pub const UNPROCESSABLE_MESSAGE: &str = "Sorry, I couldn't process that question. Please try again.";

/// Prompts the generator with retrieved context and cleans up what comes back.
pub struct Answerer {
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
    sanitizer: ArtifactSanitizer,
}

impl Answerer {
    pub fn new(generator: Arc<dyn Generator>, template: PromptTemplate, sanitizer: ArtifactSanitizer) -> Self {
        Self { generator, template, sanitizer }
    }

    pub fn from_settings(settings: &AnswerSettings, generator: Arc<dyn Generator>) -> Result<Self> {
        let template = PromptTemplate::new(settings.prompt_template.clone())?;
        let sanitizer = ArtifactSanitizer::from_settings(settings)?;
        Ok(Self::new(generator, template, sanitizer))
    }

    pub fn prompt_for(&self, query: &str, retrieved: &RetrievalResult) -> String {
        self.template.render(query, retrieved)
    }

    /// Never fails: errors and non-text output become [`UNPROCESSABLE_MESSAGE`],
    /// empty output becomes [`NO_ANSWER_MESSAGE`].
    pub fn answer(&self, query: &str, retrieved: &RetrievalResult) -> Answer {
        let prompt = self.prompt_for(query, retrieved);
        debug!(model = self.generator.model_id(), chunks = retrieved.len(), prompt_chars = prompt.len(), "generating answer");
        match self.generator.generate(&prompt) {
            Ok(GenerationOutput::Text(raw)) => self.finish(&raw),
            Ok(GenerationOutput::Structured(value)) => {
                warn!(model = self.generator.model_id(), response = %value, "model returned non-text output");
                Answer::new(UNPROCESSABLE_MESSAGE, AnswerKind::Unprocessable)
            }
            Err(e) => {
                warn!(model = self.generator.model_id(), error = %format!("{e:#}"), "generation failed");
                Answer::new(UNPROCESSABLE_MESSAGE, AnswerKind::Unprocessable)
            }
        }
    }

    /// Sanitize raw model text into an answer.
    pub fn finish(&self, raw: &str) -> Answer {
        let cleaned = self.sanitizer.sanitize(raw);
        if cleaned.is_empty() {
            debug!(raw_chars = raw.len(), "sanitized answer is empty");
            Answer::new(NO_ANSWER_MESSAGE, AnswerKind::NoAnswer)
        } else {
            Answer::new(cleaned, AnswerKind::Generated)
        }
    }
}
