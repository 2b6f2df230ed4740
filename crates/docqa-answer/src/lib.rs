//! docqa-answer
//!
//! Turns a question plus retrieved chunks into a clean answer: prompt
//! rendering, the generation call, and artifact-token sanitization.

pub mod answerer;
pub mod generator;
pub mod prompt;
pub mod sanitizer;

pub use answerer::{Answerer, NO_ANSWER_MESSAGE, UNPROCESSABLE_MESSAGE};
pub use generator::ChatCompletionsGenerator;
pub use prompt::PromptTemplate;
pub use sanitizer::ArtifactSanitizer;
