//! Intent classification — one completion call per message.

use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::llm::{CompletionModel, CompletionOptions};
use crate::pipeline::Label;
use crate::providers::RawMessage;

/// Max tokens for the classify call (a one-word answer is expected).
const CLASSIFY_MAX_TOKENS: u32 = 60;

/// Temperature for classification (near-deterministic).
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Classifies a fetched message into one intent label.
pub struct Classifier {
    llm: Arc<dyn CompletionModel>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn CompletionModel>) -> Self {
        Self { llm }
    }

    /// Classify one message.
    ///
    /// A failed completion call is `ClassificationUnavailable`. `NotSure`
    /// is reserved for a successful call whose content matches no known
    /// label — the two cases must never blur into each other.
    pub async fn classify(&self, message: &RawMessage) -> Result<Label, PipelineError> {
        let prompt = build_classify_prompt(message);

        let response = self
            .llm
            .complete(
                &prompt,
                CompletionOptions {
                    max_tokens: CLASSIFY_MAX_TOKENS,
                    temperature: CLASSIFY_TEMPERATURE,
                },
            )
            .await
            .map_err(|e| PipelineError::ClassificationUnavailable {
                reason: e.to_string(),
            })?;

        let label = Label::from_response(&response);
        debug!(raw = %response.trim(), label = %label, "Classified message");
        Ok(label)
    }
}

/// Build the classification prompt from the fetched message. The text
/// is the plain concatenation `subject snippet body`.
fn build_classify_prompt(message: &RawMessage) -> String {
    format!(
        "Based on the following text just give one word answer, categorizing the text \
         based on the content and assign a label from the given options: Interested, \
         Not Interested, More information. Text is: {} {} {}",
        message.subject, message.snippet, message.body_text
    )
}
