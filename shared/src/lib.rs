//! DocVault Shared Library
//!
//! Wire types, the role model and input validation helpers used by the
//! backend and by API clients.

pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use models::{Document, Role};
pub use types::*;
