//! Error types for the mail triage pipeline.

use uuid::Uuid;

/// Top-level error type for the triage core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Stage {stage} timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Credential cache errors.
///
/// `Missing` and `Expired` are business failures tied to one account;
/// `StoreUnavailable` means the cache itself cannot be reached and is
/// reported separately so operators can tell the two apart.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("No credential cached for account {account}")]
    Missing { account: String },

    #[error("Credential for account {account} expired")]
    Expired { account: String },

    #[error("Credential store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

/// Mail provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {provider} has no message {message_ref}")]
    MessageNotFound {
        provider: String,
        message_ref: String,
    },

    #[error("Provider {provider} rejected the access token")]
    Unauthorized { provider: String },

    #[error("Provider {provider} request failed with status {status}: {reason}")]
    RequestFailed {
        provider: String,
        status: u16,
        reason: String,
    },

    #[error("Delivery via {provider} failed: {reason}")]
    DeliveryFailed { provider: String, reason: String },

    #[error("Malformed message payload from {provider}: {reason}")]
    MalformedMessage { provider: String, reason: String },
}

/// Completion service errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Completion request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Completion response carried no content")]
    EmptyResponse,
}

/// Pipeline stage errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Classification unavailable: {reason}")]
    ClassificationUnavailable { reason: String },

    #[error("Reply composition failed: {reason}")]
    CompositionFailed { reason: String },
}

/// Job queue errors.
///
/// `Infrastructure` means the queue backend cannot be reached at all —
/// jobs cannot be claimed, which is an operational signal rather than a
/// per-job failure.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue infrastructure unavailable: {reason}")]
    Infrastructure { reason: String },

    #[error("Job {id} not found")]
    UnknownJob { id: Uuid },

    #[error("Job {id} already in state {state}, cannot transition to {target}")]
    InvalidTransition {
        id: Uuid,
        state: String,
        target: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the triage core.
pub type Result<T> = std::result::Result<T, Error>;
