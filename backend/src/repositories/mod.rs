//! Database repositories
//!
//! Each store is a trait so that services can run against PostgreSQL in
//! production and against the in-memory implementations in tests.

pub mod document;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod revoked_token;
pub mod user;

use thiserror::Error;

pub use document::{DocumentFilter, DocumentStore, PgDocumentStore};
pub use revoked_token::{NewRevokedToken, PgRevokedTokenStore, RevokedTokenEntry, RevokedTokenStore};
pub use user::{NewUser, PgUserStore, UserRecord, UserStore};

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("record already exists")]
    AlreadyExists,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Map a failed insert, turning unique violations into `AlreadyExists`
pub(crate) fn map_write_error(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::AlreadyExists;
        }
    }
    StoreError::Database(err)
}
