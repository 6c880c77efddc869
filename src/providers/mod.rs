//! Mail provider adapters — pure I/O, no business logic.
//!
//! One interface hides each service's wire format from the pipeline.
//! The adapter is selected once per job by queue name, never re-decided
//! at individual call sites.

mod gmail;
mod outlook;

pub use gmail::GmailProvider;
pub use outlook::OutlookProvider;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::pipeline::ComposedReply;

// ── Fetched message ─────────────────────────────────────────────────

/// Provider-neutral view of a fetched message.
///
/// Adapters convert their native payloads into this struct; the
/// classifier consumes `subject + snippet + body_text` verbatim.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub subject: String,
    /// Short preview supplied by the provider.
    pub snippet: String,
    /// Plain-text body. Empty when the provider carries no text part.
    pub body_text: String,
}

// ── Delivery receipt ────────────────────────────────────────────────

/// Proof that the remote service accepted one delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub provider: String,
    /// Provider-assigned id of the sent message.
    pub message_id: String,
}

// ── Provider trait ──────────────────────────────────────────────────

/// Trait for mail provider adapters.
///
/// Both operations take the access token per call; the adapter holds no
/// credential state. `send_reply` performs exactly one remote delivery
/// attempt — retry policy, if any, belongs to the caller.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Provider name, also used as the queue name (e.g. "gmail", "outlook").
    fn name(&self) -> &str;

    /// Fetch one message by provider-specific reference.
    ///
    /// Fails with `MessageNotFound` when the provider reports no such
    /// message, or `Unauthorized` when it rejects the token.
    async fn fetch_message(
        &self,
        message_ref: &str,
        token: &str,
    ) -> Result<RawMessage, ProviderError>;

    /// Deliver a composed reply to `recipient`.
    ///
    /// Fails with `DeliveryFailed` carrying the provider's error detail
    /// on any non-success remote response.
    async fn send_reply(
        &self,
        reply: &ComposedReply,
        recipient: &str,
        token: &str,
    ) -> Result<DeliveryReceipt, ProviderError>;
}

// ── Shared status mapping ───────────────────────────────────────────

/// Map a non-success fetch response to the provider error taxonomy.
fn fetch_error(provider: &str, message_ref: &str, status: u16, detail: String) -> ProviderError {
    match status {
        404 => ProviderError::MessageNotFound {
            provider: provider.to_string(),
            message_ref: message_ref.to_string(),
        },
        401 | 403 => ProviderError::Unauthorized {
            provider: provider.to_string(),
        },
        _ => ProviderError::RequestFailed {
            provider: provider.to_string(),
            status,
            reason: detail,
        },
    }
}

/// Map a non-success send response. The send contract is blunt: any
/// remote rejection is a delivery failure with the provider's detail.
fn send_error(provider: &str, status: u16, detail: String) -> ProviderError {
    ProviderError::DeliveryFailed {
        provider: provider.to_string(),
        reason: format!("status {status}: {detail}"),
    }
}
