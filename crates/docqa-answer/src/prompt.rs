use docqa_core::config::DEFAULT_PROMPT_TEMPLATE;
use docqa_core::error::{Error, Result};
use docqa_core::types::RetrievalResult;

const QUESTION: &str = "{question}";
const CONTEXT: &str = "{context}";
const CHUNK_SEPARATOR: &str = "\n\n";

/// Prompt text with `{question}` and optional `{context}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(QUESTION) {
            return Err(Error::invalid_config("prompt template must contain {question}"));
        }
        Ok(Self { template })
    }

    /// Substitute placeholders in one pass, so braces inside the question or
    /// the retrieved text are never expanded.
    pub fn render(&self, question: &str, retrieved: &RetrievalResult) -> String {
        let context = retrieved.texts().collect::<Vec<_>>().join(CHUNK_SEPARATOR);
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(QUESTION) {
                out.push_str(question);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(CONTEXT) {
                out.push_str(&context);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self { Self { template: DEFAULT_PROMPT_TEMPLATE.to_string() } }
}
