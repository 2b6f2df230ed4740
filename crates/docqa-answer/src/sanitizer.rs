//! Removes model-specific artifact tokens from generated text.

use regex::Regex;
use std::borrow::Cow;

use docqa_core::config::AnswerSettings;
use docqa_core::error::{Error, Result};

// Upper bound on removal passes for deeply nested marker fragments.
const MAX_PASSES: usize = 64;

/// Strips configured marker literals and pattern matches, then trims.
///
/// All rules are compiled into one alternation. Literals are tried longest first so `<|im_end|>` wins over
/// a configured `<|im_`.
#[derive(Debug, Clone)]
pub struct ArtifactSanitizer {
    matcher: Option<Regex>,
}

impl ArtifactSanitizer {
    pub fn new<M, P>(markers: M, patterns: P) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut literals: Vec<String> = markers
            .into_iter()
            .map(|m| m.as_ref().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        literals.dedup();

        let mut alternatives: Vec<String> = literals.iter().map(|m| regex::escape(m)).collect();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if pattern.is_empty() { continue; }
            Regex::new(pattern)
                .map_err(|e| Error::invalid_config(format!("invalid artifact pattern {pattern:?}: {e}")))?;
            alternatives.push(format!("(?:{pattern})"));
        }

        if alternatives.is_empty() {
            return Ok(Self { matcher: None });
        }
        let matcher = Regex::new(&alternatives.join("|"))
            .map_err(|e| Error::invalid_config(format!("artifact rules do not compile together: {e}")))?;
        Ok(Self { matcher: Some(matcher) })
    }

    pub fn from_settings(settings: &AnswerSettings) -> Result<Self> {
        Self::new(&settings.artifact_markers, &settings.artifact_patterns)
    }

    /// A sanitizer that only trims.
    pub fn none() -> Self { Self { matcher: None } }

    /// Removal repeats until nothing matches, so markers split around
    /// another marker (`<th<think>ink>`) are removed too.
    pub fn sanitize(&self, raw: &str) -> String {
        let Some(re) = &self.matcher else {
            return raw.trim().to_string();
        };
        let mut text = raw.to_string();
        for _ in 0..MAX_PASSES {
            match re.replace_all(&text, "") {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) if next != text => text = next,
                Cow::Owned(_) => break,
            }
        }
        text.trim().to_string()
    }
}

impl Default for ArtifactSanitizer {
    fn default() -> Self {
        Self::from_settings(&AnswerSettings::default()).unwrap_or_else(|_| Self::none())
    }
}
