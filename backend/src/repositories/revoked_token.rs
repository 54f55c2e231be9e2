//! Storage for the revocation ledger

use super::{map_write_error, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Ledger row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevokedTokenEntry {
    pub id: Uuid,
    pub token_hash: String,
    pub user_id: Option<Uuid>,
    pub invalidated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for a ledger insert
#[derive(Debug, Clone)]
pub struct NewRevokedToken {
    pub token_hash: String,
    pub user_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait RevokedTokenStore: Send + Sync {
    /// Inserting a digest that is already present succeeds without a new row
    async fn insert(&self, entry: &NewRevokedToken) -> Result<(), StoreError>;

    async fn exists(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Remove rows with `expires_at < now`, returning how many went
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// PostgreSQL-backed ledger table (`blacklisted_tokens`)
#[derive(Clone)]
pub struct PgRevokedTokenStore {
    pool: PgPool,
}

impl PgRevokedTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RevokedTokenEntry>, StoreError> {
        let entry = sqlx::query_as::<_, RevokedTokenEntry>(
            r#"
            SELECT id, token_hash, user_id, invalidated_at, expires_at, created_at
            FROM blacklisted_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }
}

#[async_trait]
impl RevokedTokenStore for PgRevokedTokenStore {
    async fn insert(&self, entry: &NewRevokedToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO blacklisted_tokens (id, token_hash, user_id, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&entry.token_hash)
        .bind(entry.user_id)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn exists(&self, token_hash: &str) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM blacklisted_tokens WHERE token_hash = $1)
            "#,
        )
        .bind(token_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
