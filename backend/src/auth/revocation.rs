//! Revocation ledger
//!
//! Records SHA-256 digests of invalidated tokens. Raw tokens are never
//! stored. Every entry expires a fixed seven days after it is written,
//! whatever the lifetime of the token it covers.

use crate::repositories::{NewRevokedToken, RevokedTokenStore, StoreError};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Lifetime of a ledger entry
pub const LEDGER_ENTRY_TTL_DAYS: i64 = 7;

/// Lowercase hex SHA-256 of the raw token string
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Clone)]
pub struct RevocationLedger {
    store: Arc<dyn RevokedTokenStore>,
}

impl RevocationLedger {
    pub fn new(store: Arc<dyn RevokedTokenStore>) -> Self {
        Self { store }
    }

    /// Record `token` as invalid. Revoking the same token twice is a no-op.
    pub async fn revoke(&self, token: &str, owner: Option<Uuid>) -> Result<(), StoreError> {
        let entry = NewRevokedToken {
            token_hash: token_digest(token),
            user_id: owner,
            expires_at: Utc::now() + Duration::days(LEDGER_ENTRY_TTL_DAYS),
        };
        self.store.insert(&entry).await?;
        debug!(user_id = ?owner, "Token revoked");
        Ok(())
    }

    /// Membership only; entry expiry is not consulted here.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        self.store.exists(&token_digest(token)).await
    }

    /// Delete entries whose `expires_at` has passed
    pub async fn prune_expired(&self) -> Result<u64, StoreError> {
        self.store.delete_expired(Utc::now()).await
    }

    /// Run `prune_expired` every `period` until the runtime shuts down
    pub fn spawn_sweeper(self, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                match self.prune_expired().await {
                    Ok(0) => debug!("Ledger sweep found no expired entries"),
                    Ok(pruned) => info!(pruned, "Pruned expired revocation entries"),
                    Err(e) => error!(error = ?e, "Ledger sweep failed"),
                }
            }
        })
    }
}
