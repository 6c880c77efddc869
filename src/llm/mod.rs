//! Completion service client.
//!
//! The pipeline treats the generative service as a black box: one prompt
//! in, free text out, parameterized by `{model, max_tokens, temperature}`.
//! The model id is client-level configuration; per-call knobs travel in
//! `CompletionOptions`.

mod openai;

pub use openai::OpenAiClient;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Per-request parameters for a completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A completion backend.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Issue one completion request and return the raw text content.
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String, LlmError>;
}

/// Create the completion client from configuration.
pub fn create_model(config: &LlmConfig) -> Result<Arc<dyn CompletionModel>, LlmError> {
    let client = OpenAiClient::new(config)?;
    tracing::info!("Using chat-completions backend (model: {})", config.model);
    Ok(Arc::new(client))
}
