//! OpenAI-compatible chat-completions client over reqwest.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::{CompletionModel, CompletionOptions};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: SecretString,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::RequestFailed {
                reason: format!("build http client: {e}"),
            })?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiClient {
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": opts.max_tokens,
            "temperature": opts.temperature,
        });

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("status {status}: {detail}"),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| LlmError::RequestFailed {
            reason: format!("decode response: {e}"),
        })?;

        // A response with no choices or null content carried no output
        // at all. A present-but-empty string is a successful output and
        // is handed to the caller as-is.
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}
