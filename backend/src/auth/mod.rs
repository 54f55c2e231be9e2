//! Authentication module
//!
//! Token codec, password hashing, the revocation ledger and the request
//! gate built on top of them.

mod jwt;
mod middleware;
mod password;
mod revocation;

pub use jwt::{
    Claims, JwtKeys, JwtService, TokenError, TokenIdentity, TokenKind, ACCESS_TOKEN_TTL_SECS,
    REFRESH_TOKEN_TTL_SECS,
};
pub use middleware::{
    auth_middleware, bearer_token, require_roles, AuthUser, BearerToken, ADMIN_ROLES,
    INSUFFICIENT_PERMISSIONS, SUPERADMIN_ROLES, USER_ROLES,
};
pub use password::{PasswordError, PasswordService};
pub use revocation::{token_digest, RevocationLedger, LEDGER_ENTRY_TTL_DAYS};
