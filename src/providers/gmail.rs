//! Gmail-style adapter.
//!
//! Outbound mail is a full RFC-822-style envelope, base64url-encoded
//! into the API's `raw` field. Inbound body text lives in the
//! `text/plain` part of a multipart payload, itself base64url-encoded.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::error::ProviderError;
use crate::pipeline::ComposedReply;
use crate::providers::{fetch_error, send_error, DeliveryReceipt, MailProvider, RawMessage};

const PROVIDER_NAME: &str = "gmail";

pub struct GmailProvider {
    http: reqwest::Client,
    api_base: String,
}

impl GmailProvider {
    /// `api_base` is the Gmail REST root, e.g.
    /// `https://gmail.googleapis.com/gmail/v1` (overridable for tests).
    pub fn new(api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GmailMessage {
    #[serde(default)]
    snippet: String,
    payload: Option<GmailPayload>,
}

#[derive(Debug, Deserialize)]
struct GmailPayload {
    #[serde(default)]
    headers: Vec<GmailHeader>,
    #[serde(default)]
    parts: Vec<GmailPart>,
    body: Option<GmailBody>,
}

#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct GmailPart {
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    body: Option<GmailBody>,
}

#[derive(Debug, Deserialize)]
struct GmailBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailSendResponse {
    id: Option<String>,
}

// ── Payload handling ────────────────────────────────────────────────

fn subject_of(payload: &GmailPayload) -> String {
    payload
        .headers
        .iter()
        .find(|h| h.name == "Subject")
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

/// Pull plain text out of a Gmail payload.
///
/// Multipart messages carry it in the `text/plain` part; single-part
/// messages carry it in the top-level body. A message with neither
/// yields empty text rather than an error.
fn text_of(payload: &GmailPayload) -> Result<String, ProviderError> {
    let data = if payload.parts.is_empty() {
        payload.body.as_ref().and_then(|b| b.data.as_deref())
    } else {
        payload
            .parts
            .iter()
            .find(|p| p.mime_type == "text/plain")
            .and_then(|p| p.body.as_ref())
            .and_then(|b| b.data.as_deref())
    };

    match data {
        Some(encoded) => {
            let bytes =
                URL_SAFE_NO_PAD
                    .decode(encoded)
                    .map_err(|e| ProviderError::MalformedMessage {
                        provider: PROVIDER_NAME.to_string(),
                        reason: format!("body data is not base64url: {e}"),
                    })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => Ok(String::new()),
    }
}

/// Build the RFC-822-style envelope for one reply. The authenticated
/// account is the sender, so no `From` header is written.
fn build_envelope(reply: &ComposedReply, recipient: &str) -> String {
    format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}",
        recipient, reply.subject, reply.html_body
    )
}

// ── Adapter ─────────────────────────────────────────────────────────

#[async_trait]
impl MailProvider for GmailProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_message(
        &self,
        message_ref: &str,
        token: &str,
    ) -> Result<RawMessage, ProviderError> {
        let url = format!(
            "{}/users/me/messages/{}?format=full",
            self.api_base, message_ref
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                status: 0,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(fetch_error(
                PROVIDER_NAME,
                message_ref,
                status.as_u16(),
                detail,
            ));
        }

        let message: GmailMessage =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedMessage {
                    provider: PROVIDER_NAME.to_string(),
                    reason: format!("decode message: {e}"),
                })?;

        let payload = message
            .payload
            .ok_or_else(|| ProviderError::MalformedMessage {
                provider: PROVIDER_NAME.to_string(),
                reason: "message has no payload".to_string(),
            })?;

        Ok(RawMessage {
            subject: subject_of(&payload),
            snippet: message.snippet,
            body_text: text_of(&payload)?,
        })
    }

    async fn send_reply(
        &self,
        reply: &ComposedReply,
        recipient: &str,
        token: &str,
    ) -> Result<DeliveryReceipt, ProviderError> {
        let raw = URL_SAFE_NO_PAD.encode(build_envelope(reply, recipient));
        let url = format!("{}/users/me/messages/send", self.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| ProviderError::DeliveryFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(send_error(PROVIDER_NAME, status.as_u16(), detail));
        }

        let sent: GmailSendResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedMessage {
                    provider: PROVIDER_NAME.to_string(),
                    reason: format!("decode send response: {e}"),
                })?;

        let message_id = sent.id.ok_or_else(|| ProviderError::MalformedMessage {
            provider: PROVIDER_NAME.to_string(),
            reason: "send response missing id".to_string(),
        })?;

        Ok(DeliveryReceipt {
            provider: PROVIDER_NAME.to_string(),
            message_id,
        })
    }
}
