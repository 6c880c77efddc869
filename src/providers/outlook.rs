//! Outlook-style adapter (Microsoft Graph wire format).
//!
//! Fetch returns body content directly in JSON — no multipart walk, no
//! base64. Outbound mail is a structured `sendMail` body with a
//! separate `toRecipients` list; the service answers 202 with no body.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::ProviderError;
use crate::pipeline::ComposedReply;
use crate::providers::{fetch_error, send_error, DeliveryReceipt, MailProvider, RawMessage};

const PROVIDER_NAME: &str = "outlook";

pub struct OutlookProvider {
    http: reqwest::Client,
    api_base: String,
}

impl OutlookProvider {
    /// `api_base` is the Graph root, e.g. `https://graph.microsoft.com/v1.0`
    /// (overridable for tests).
    pub fn new(api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OutlookMessage {
    #[serde(default)]
    subject: String,
    #[serde(rename = "bodyPreview", default)]
    body_preview: String,
    body: Option<OutlookBody>,
}

#[derive(Debug, Deserialize)]
struct OutlookBody {
    #[serde(default)]
    content: String,
}

fn send_mail_body(reply: &ComposedReply, recipient: &str) -> serde_json::Value {
    json!({
        "message": {
            "subject": reply.subject,
            "body": {
                "contentType": "HTML",
                "content": reply.html_body,
            },
            "toRecipients": [
                { "emailAddress": { "address": recipient } }
            ],
        },
        "saveToSentItems": false,
    })
}

// ── Adapter ─────────────────────────────────────────────────────────

#[async_trait]
impl MailProvider for OutlookProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_message(
        &self,
        message_ref: &str,
        token: &str,
    ) -> Result<RawMessage, ProviderError> {
        let url = format!("{}/me/messages/{}", self.api_base, message_ref);

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

        let message: OutlookMessage =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedMessage {
                    provider: PROVIDER_NAME.to_string(),
                    reason: format!("decode message: {e}"),
                })?;

        Ok(RawMessage {
            subject: message.subject,
            snippet: message.body_preview,
            body_text: message.body.map(|b| b.content).unwrap_or_default(),
        })
    }

    async fn send_reply(
        &self,
        reply: &ComposedReply,
        recipient: &str,
        token: &str,
    ) -> Result<DeliveryReceipt, ProviderError> {
        let url = format!("{}/me/sendMail", self.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&send_mail_body(reply, recipient))
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

        // Graph answers 202 Accepted with an empty body; the request-id
        // header is the only receipt it offers.
        let message_id = response
            .headers()
            .get("request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("accepted")
            .to_string();

        Ok(DeliveryReceipt {
            provider: PROVIDER_NAME.to_string(),
            message_id,
        })
    }
}
