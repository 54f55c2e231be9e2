//! JWT token generation and validation
//!
//! Access and refresh tokens are HS256 JWTs carrying `{userId, email}` plus
//! a token type and a random `jti`. Keys are derived once and shared.

use crate::auth::revocation::RevocationLedger;
use crate::config::JwtConfig;
use crate::error::ApiError;
use anyhow::Result;
use chrono::{Duration, Utc};
use docvault_shared::TokenPair;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Access token lifetime: 10 minutes
pub const ACCESS_TOKEN_TTL_SECS: i64 = 600;
/// Refresh token lifetime: 7 days
pub const REFRESH_TOKEN_TTL_SECS: i64 = 604_800;

/// Which secret and lifetime a token uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn ttl_secs(self) -> i64 {
        match self {
            TokenKind::Access => ACCESS_TOKEN_TTL_SECS,
            TokenKind::Refresh => REFRESH_TOKEN_TTL_SECS,
        }
    }
}

/// Identity embedded in every token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub email: String,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub token_type: TokenKind,
    /// Unique per token, so two tokens minted in the same second differ
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity {
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token is not yet valid")]
    NotYetValid,
    #[error("token verification failed")]
    VerificationFailed,
    #[error("token has been revoked")]
    Revoked,
    #[error("revocation ledger unavailable")]
    LedgerUnavailable,
}

impl TokenError {
    /// Client-facing reason for the rejection
    pub fn message(self, kind: TokenKind) -> &'static str {
        match (kind, self) {
            (TokenKind::Access, TokenError::Malformed) => "Invalid token",
            (TokenKind::Access, TokenError::Expired) => "Token expired",
            (TokenKind::Access, TokenError::NotYetValid) => "Token not active",
            (TokenKind::Access, TokenError::VerificationFailed) => "Token verification failed",
            (TokenKind::Access, TokenError::Revoked) => "Access token has been invalidated",
            (TokenKind::Refresh, TokenError::Malformed) => "Invalid refresh token",
            (TokenKind::Refresh, TokenError::Expired) => "Refresh token expired",
            (TokenKind::Refresh, TokenError::NotYetValid) => "Refresh token not active",
            (TokenKind::Refresh, TokenError::VerificationFailed) => {
                "Refresh token verification failed"
            }
            (TokenKind::Refresh, TokenError::Revoked) => "Refresh token has been invalidated",
            (_, TokenError::LedgerUnavailable) => "Failed to verify token status",
        }
    }

    /// Every token rejection is an authentication failure
    pub fn into_api_error(self, kind: TokenKind) -> ApiError {
        ApiError::Unauthorized(self.message(kind).to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::VerificationFailed,
        }
    }
}

/// Pre-computed JWT keys for efficient token operations
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Token codec
///
/// Holds one key pair per token kind. Build it once from `JwtConfig` at
/// startup and clone it into handlers; cloning only bumps `Arc` counts.
#[derive(Clone)]
pub struct JwtService {
    access: JwtKeys,
    refresh: JwtKeys,
    validation: Arc<Validation>,
}

impl JwtService {
    /// `refresh_secret` falls back to `access_secret` when `None`
    pub fn new(access_secret: &str, refresh_secret: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;

        Self {
            access: JwtKeys::new(access_secret),
            refresh: JwtKeys::new(refresh_secret.unwrap_or(access_secret)),
            validation: Arc::new(validation),
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.access_secret, config.refresh_secret.as_deref())
    }

    fn keys(&self, kind: TokenKind) -> &JwtKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    #[inline]
    pub fn issue_access_token(&self, identity: &TokenIdentity) -> Result<String> {
        self.issue(identity, TokenKind::Access)
    }

    #[inline]
    pub fn issue_refresh_token(&self, identity: &TokenIdentity) -> Result<String> {
        self.issue(identity, TokenKind::Refresh)
    }

    /// Mint a fresh access/refresh pair for the same identity
    pub fn issue_pair(&self, identity: &TokenIdentity) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(identity)?,
            refresh_token: self.issue_refresh_token(identity)?,
        })
    }

    fn issue(&self, identity: &TokenIdentity, kind: TokenKind) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            token_type: kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(kind.ttl_secs())).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, self.keys(kind).encoding())
            .map_err(|e| anyhow::anyhow!("Failed to sign {:?} token: {}", kind, e))
    }

    /// Signature, expiry and token-type check. No I/O.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, self.keys(kind).decoding(), &self.validation)?;

        if data.claims.token_type != kind {
            return Err(TokenError::Malformed);
        }
        Ok(data.claims)
    }

    /// `verify` followed by a ledger lookup
    ///
    /// A ledger failure rejects the token with `LedgerUnavailable`; it is
    /// never treated as "not revoked".
    pub async fn verify_with_revocation_check(
        &self,
        token: &str,
        kind: TokenKind,
        ledger: &RevocationLedger,
    ) -> Result<Claims, TokenError> {
        let claims = self.verify(token, kind)?;

        match ledger.is_revoked(token).await {
            Ok(false) => Ok(claims),
            Ok(true) => {
                warn!(user_id = %claims.user_id, token_type = ?kind, "Rejected revoked token");
                Err(TokenError::Revoked)
            }
            Err(e) => {
                error!(error = ?e, user_id = %claims.user_id, "Revocation ledger lookup failed");
                Err(TokenError::LedgerUnavailable)
            }
        }
    }
}
