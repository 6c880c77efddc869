//! Redis-backed credential store.
//!
//! Records are serialized as JSON under a `credential:` prefix with the
//! TTL handed to Redis via `SET .. EX`, so expired entries are deleted
//! server-side and read back as absent.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::credentials::{Credential, CredentialStore};
use crate::error::CredentialError;

const KEY_PREFIX: &str = "credential:";

pub struct RedisCredentialStore {
    conn: ConnectionManager,
}

impl RedisCredentialStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(account_id: &str) -> String {
        format!("{KEY_PREFIX}{account_id}")
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn get(&self, account_id: &str) -> Result<Option<Credential>, CredentialError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> =
            conn.get(Self::key(account_id))
                .await
                .map_err(|e| CredentialError::StoreUnavailable {
                    reason: e.to_string(),
                })?;

        match raw {
            Some(json) => {
                let credential =
                    serde_json::from_str(&json).map_err(|e| CredentialError::StoreUnavailable {
                        reason: format!("corrupt credential record: {e}"),
                    })?;
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        account_id: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<(), CredentialError> {
        let credential = Credential::new(account_id, token, ttl);
        let json =
            serde_json::to_string(&credential).map_err(|e| CredentialError::StoreUnavailable {
                reason: format!("serialize credential: {e}"),
            })?;

        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(Self::key(account_id))
            .arg(json)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| CredentialError::StoreUnavailable {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
