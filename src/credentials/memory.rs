//! In-memory credential store for tests and single-process runs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::credentials::{Credential, CredentialStore};
use crate::error::CredentialError;

/// RwLock-backed credential map. Expired entries are kept until
/// overwritten; callers see `expires_at` and treat them as absent.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, account_id: &str) -> Result<Option<Credential>, CredentialError> {
        Ok(self.entries.read().await.get(account_id).cloned())
    }

    async fn set(
        &self,
        account_id: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<(), CredentialError> {
        let credential = Credential::new(account_id, token, ttl);
        self.entries
            .write()
            .await
            .insert(account_id.to_string(), credential);
        Ok(())
    }
}
