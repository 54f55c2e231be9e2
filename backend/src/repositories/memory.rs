//! In-memory stores for tests
//!
//! Each store can be told to fail every call, which is how tests exercise
//! the infrastructure-failure paths without a database.

use super::{
    DocumentFilter, DocumentStore, NewRevokedToken, NewUser, RevokedTokenEntry, RevokedTokenStore,
    StoreError, UserRecord, UserStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_shared::{CreateDocumentRequest, Document, UpdateDocumentRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected_failure() -> StoreError {
    StoreError::Other(anyhow::anyhow!("injected store failure"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
    failing: AtomicBool,
    blind_lookups: AtomicBool,
}

impl InMemoryUserStore {
    /// Insert a record directly, bypassing the uniqueness check
    pub fn insert(&self, user: UserRecord) {
        lock(&self.users).push(user);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `find_by_email` miss every user, as a concurrent registration
    /// that has not committed yet would
    pub fn set_blind_lookups(&self, blind: bool) {
        self.blind_lookups.store(blind, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        lock(&self.users).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.check()?;
        if self.blind_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(lock(&self.users)
            .iter()
            .find(|u| u.email.to_lowercase() == email.to_lowercase())
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        self.check()?;
        let mut users = lock(&self.users);
        let email = user.email.to_lowercase();
        if users.iter().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::AlreadyExists);
        }
        let record = UserRecord {
            id: Uuid::now_v7(),
            fullname: user.fullname,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Revocation ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryRevokedTokenStore {
    entries: Mutex<HashMap<String, RevokedTokenEntry>>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl InMemoryRevokedTokenStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only `insert`; lookups keep working
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    pub fn entry(&self, token_hash: &str) -> Option<RevokedTokenEntry> {
        lock(&self.entries).get(token_hash).cloned()
    }

    /// Seed an entry for a raw token with an explicit expiry
    pub fn insert_entry(&self, token: &str, expires_at: DateTime<Utc>) {
        let token_hash = crate::auth::token_digest(token);
        let now = Utc::now();
        lock(&self.entries).insert(
            token_hash.clone(),
            RevokedTokenEntry {
                id: Uuid::now_v7(),
                token_hash,
                user_id: None,
                invalidated_at: now,
                expires_at,
                created_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl RevokedTokenStore for InMemoryRevokedTokenStore {
    async fn insert(&self, entry: &NewRevokedToken) -> Result<(), StoreError> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let now = Utc::now();
        lock(&self.entries)
            .entry(entry.token_hash.clone())
            .or_insert_with(|| RevokedTokenEntry {
                id: Uuid::now_v7(),
                token_hash: entry.token_hash.clone(),
                user_id: entry.user_id,
                invalidated_at: now,
                expires_at: entry.expires_at,
                created_at: now,
            });
        Ok(())
    }

    async fn exists(&self, token_hash: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(lock(&self.entries).contains_key(token_hash))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check()?;
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at >= now);
        Ok((before - entries.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<Vec<Document>>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only `create` and `update`; reads keep working
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

fn matches(document: &Document, filter: &DocumentFilter) -> bool {
    let contains = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };

    filter.search.as_deref().map_or(true, |s| {
        contains(&document.number, s) || contains(&document.title, s) || contains(&document.lookup, s)
    }) && filter
        .project
        .as_deref()
        .map_or(true, |p| document.project == p)
        && filter
            .discipline
            .as_deref()
            .map_or(true, |d| document.discipline == d)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(
        &self,
        filter: &DocumentFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Document>, u64), StoreError> {
        self.check()?;
        let documents = lock(&self.documents);
        let matching: Vec<&Document> = documents.iter().filter(|d| matches(d, filter)).collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn find(&self, number: &str) -> Result<Option<Document>, StoreError> {
        self.check()?;
        Ok(lock(&self.documents).iter().find(|d| d.number == number).cloned())
    }

    async fn exists(&self, number: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(lock(&self.documents).iter().any(|d| d.number == number))
    }

    async fn create(&self, document: &CreateDocumentRequest) -> Result<Document, StoreError> {
        self.check_write()?;
        let mut documents = lock(&self.documents);
        if documents.iter().any(|d| d.number == document.number) {
            return Err(StoreError::AlreadyExists);
        }
        let created = Document {
            number: document.number.clone(),
            title: document.title.clone(),
            availability: document.availability,
            file_path: document.file_path.clone(),
            project: document.project.clone(),
            discipline: document.discipline.clone(),
            wp: document.wp.clone(),
            lookup: document.lookup.clone(),
            created_at: Utc::now(),
        };
        documents.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        number: &str,
        changes: &UpdateDocumentRequest,
    ) -> Result<Option<Document>, StoreError> {
        self.check_write()?;
        let mut documents = lock(&self.documents);
        let Some(document) = documents.iter_mut().find(|d| d.number == number) else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            document.title = title.clone();
        }
        if let Some(availability) = changes.availability {
            document.availability = availability;
        }
        if let Some(file_path) = &changes.file_path {
            document.file_path = file_path.clone();
        }
        if let Some(project) = &changes.project {
            document.project = project.clone();
        }
        if let Some(discipline) = &changes.discipline {
            document.discipline = discipline.clone();
        }
        if let Some(wp) = &changes.wp {
            document.wp = wp.clone();
        }
        if let Some(lookup) = &changes.lookup {
            document.lookup = lookup.clone();
        }
        Ok(Some(document.clone()))
    }

    async fn delete(&self, number: &str) -> Result<Option<Document>, StoreError> {
        self.check()?;
        let mut documents = lock(&self.documents);
        let position = documents.iter().position(|d| d.number == number);
        Ok(position.map(|i| documents.remove(i)))
    }
}
