//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the token codec and file storage.

pub mod auth;
pub mod document;

pub use auth::AuthService;
pub use document::{DocumentService, DocumentUpload};
