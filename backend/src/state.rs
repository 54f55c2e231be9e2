//! Application state
//!
//! Shared resources passed to every handler through Axum's state
//! extraction. Everything in here is cheap to clone: the pool and the
//! services are internally reference counted.

use crate::auth::{JwtService, RevocationLedger};
use crate::config::AppConfig;
use crate::repositories::{
    DocumentStore, PgDocumentStore, PgRevokedTokenStore, PgUserStore, RevokedTokenStore,
    UserStore,
};
use crate::services::{AuthService, DocumentService};
use crate::storage::FileStorage;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Application configuration
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub documents: DocumentService,
}

impl AppState {
    /// Build the state on top of the Postgres stores
    ///
    /// JWT keys are derived here, once, and shared by every request.
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let users = Arc::new(PgUserStore::new(db.clone()));
        let revoked = Arc::new(PgRevokedTokenStore::new(db.clone()));
        let documents = Arc::new(PgDocumentStore::new(db.clone()));
        Self::with_stores(db, config, users, revoked, documents)
    }

    /// Build the state on top of arbitrary stores
    pub fn with_stores(
        db: PgPool,
        config: AppConfig,
        users: Arc<dyn UserStore>,
        revoked: Arc<dyn RevokedTokenStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let jwt = JwtService::from_config(&config.jwt);
        let ledger = RevocationLedger::new(revoked);
        let files = FileStorage::new(config.uploads.clone());

        Self {
            db,
            auth: AuthService::new(users, jwt, ledger),
            documents: DocumentService::new(documents, files),
            config: Arc::new(config),
        }
    }

    /// Get a reference to the database pool
    #[inline]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[inline]
    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    #[inline]
    pub fn ledger(&self) -> &RevocationLedger {
        self.auth.ledger()
    }
}
