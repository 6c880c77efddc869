//! Credential cache — expiry-aware store of per-account access tokens.
//!
//! The out-of-scope authorization flow writes; the pipeline only reads.
//! Entries are keyed by account id, never a process-wide slot, so
//! concurrent accounts cannot clobber each other's tokens.

mod memory;
mod redis;

pub use self::redis::RedisCredentialStore;
pub use memory::MemoryCredentialStore;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// A cached access token for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub account_id: String,
    pub token: String,
    /// Fixed TTL from issuance, not from last use.
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential expiring `ttl` from now.
    pub fn new(account_id: &str, token: &str, ttl: Duration) -> Self {
        Self {
            account_id: account_id.to_string(),
            token: token.to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Backend-agnostic credential cache.
///
/// This is a pure cache with expiry, not a token manager: no refresh
/// logic lives here. A backend may return an expired record (the caller
/// must treat it as absent) or delete it outright, as Redis TTL does.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for an account.
    async fn get(&self, account_id: &str) -> Result<Option<Credential>, CredentialError>;

    /// Store a token with a fixed TTL from now, overwriting any previous
    /// entry for the same account.
    async fn set(
        &self,
        account_id: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<(), CredentialError>;
}
