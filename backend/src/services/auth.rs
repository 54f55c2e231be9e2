//! Auth orchestrator: login, registration, refresh, logout and `me`
//!
//! Every flow returns `ApiResult`. Storage failures are mapped to a 500
//! with a fixed message; the underlying error is only logged.

use crate::auth::{JwtService, PasswordService, RevocationLedger, TokenIdentity, TokenKind};
use crate::error::{ApiError, ApiResult, GENERIC_FAILURE_MESSAGE};
use crate::repositories::{NewUser, StoreError, UserRecord, UserStore};
use docvault_shared::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse, Role,
    TokenPair, UserProfile,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const EMAIL_TAKEN: &str = "Email is already taken";
pub const USER_NOT_FOUND: &str = "User not found";
const CREDENTIAL_LOOKUP_FAILED: &str = "Unable to verify credentials. Please try again later";
const REGISTRATION_FAILED: &str = "Unable to register. Please try again later";

fn identity_of(user: &UserRecord) -> TokenIdentity {
    TokenIdentity {
        user_id: user.id,
        email: user.email.clone(),
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtService,
    ledger: RevocationLedger,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtService, ledger: RevocationLedger) -> Self {
        Self { users, jwt, ledger }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn ledger(&self) -> &RevocationLedger {
        &self.ledger
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<UserRecord>> {
        self.users
            .find_by_email(email)
            .await
            .map_err(|e| ApiError::infrastructure(CREDENTIAL_LOOKUP_FAILED, e))
    }

    /// Unknown email and wrong password produce the same 401
    pub async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        let Some(user) = self.find_by_email(&req.email).await? else {
            info!(reason = "unknown email", "Login rejected");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let valid = PasswordService::verify_async(req.password.clone(), user.password_hash.clone())
            .await
            .map_err(|e| ApiError::infrastructure(GENERIC_FAILURE_MESSAGE, e))?;
        if !valid {
            warn!(user_id = %user.id, reason = "wrong password", "Login rejected");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let tokens = self.jwt.issue_pair(&identity_of(&user))?;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            user: user.profile(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Duplicate emails are rejected with 401, including when a concurrent
    /// registration wins the race between lookup and insert.
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<RegisterResponse> {
        if self.find_by_email(&req.email).await?.is_some() {
            return Err(ApiError::Unauthorized(EMAIL_TAKEN.to_string()));
        }

        let password_hash = PasswordService::hash_async(req.password.clone())
            .await
            .map_err(|e| ApiError::infrastructure(GENERIC_FAILURE_MESSAGE, e))?;

        let user = self
            .users
            .create(NewUser {
                fullname: req.fullname.clone(),
                email: req.email.clone(),
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => ApiError::Unauthorized(EMAIL_TAKEN.to_string()),
                other => ApiError::infrastructure(REGISTRATION_FAILED, other),
            })?;

        info!(user_id = %user.id, "User registered");

        Ok(RegisterResponse {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
        })
    }

    /// Exchange a refresh token for a new pair and revoke the presented one.
    ///
    /// If the revocation write fails the new pair is still returned and the
    /// old refresh token stays usable until it expires.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let claims = self
            .jwt
            .verify_with_revocation_check(refresh_token, TokenKind::Refresh, &self.ledger)
            .await
            .map_err(|e| e.into_api_error(TokenKind::Refresh))?;

        let tokens = self.jwt.issue_pair(&claims.identity())?;

        if let Err(e) = self.ledger.revoke(refresh_token, Some(claims.user_id)).await {
            warn!(
                error = ?e,
                user_id = %claims.user_id,
                "Failed to revoke rotated refresh token"
            );
        }

        Ok(tokens)
    }

    /// Revoke both tokens. Both revocations are attempted even if the first
    /// fails; nothing is rolled back.
    pub async fn logout(
        &self,
        user_id: Uuid,
        access_token: &str,
        refresh_token: &str,
    ) -> ApiResult<MessageResponse> {
        self.jwt
            .verify_with_revocation_check(access_token, TokenKind::Access, &self.ledger)
            .await
            .map_err(|e| e.into_api_error(TokenKind::Access))?;

        let refresh_result = self.ledger.revoke(refresh_token, Some(user_id)).await;
        let access_result = self.ledger.revoke(access_token, Some(user_id)).await;

        match (refresh_result, access_result) {
            (Ok(()), Ok(())) => {
                info!(user_id = %user_id, "User logged out");
                Ok(MessageResponse::new("Logged out successfully"))
            }
            (refresh_result, access_result) => {
                if let Err(e) = &refresh_result {
                    error!(error = ?e, user_id = %user_id, "Failed to revoke refresh token");
                }
                if let Err(e) = &access_result {
                    error!(error = ?e, user_id = %user_id, "Failed to revoke access token");
                }
                Err(ApiError::Internal(anyhow::anyhow!("logout revocation failed")))
            }
        }
    }

    /// Profile of the token's owner, re-read from storage
    pub async fn me(&self, access_token: &str) -> ApiResult<UserProfile> {
        let claims = self
            .jwt
            .verify(access_token, TokenKind::Access)
            .map_err(|e| e.into_api_error(TokenKind::Access))?;

        self.find_by_email(&claims.email)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| ApiError::Unauthorized(USER_NOT_FOUND.to_string()))
    }

    /// Resolve a bearer access token to its owner for the request gate
    pub async fn authenticate(
        &self,
        access_token: &str,
        check_revocation: bool,
    ) -> ApiResult<UserProfile> {
        let verified = if check_revocation {
            self.jwt
                .verify_with_revocation_check(access_token, TokenKind::Access, &self.ledger)
                .await
        } else {
            self.jwt.verify(access_token, TokenKind::Access)
        };
        let claims = verified.map_err(|e| e.into_api_error(TokenKind::Access))?;

        self.find_by_email(&claims.email)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| ApiError::Unauthorized(USER_NOT_FOUND.to_string()))
    }
}
