//! Authentication middleware
//!
//! `auth_middleware` resolves the bearer token to a user and stores it in
//! the request extensions. The `AuthUser` extractor then acts as the guard:
//! a handler that takes `AuthUser` never runs without an identity.
//! `require_roles` layers role checks on top.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use docvault_shared::{Role, UserProfile};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};
use uuid::Uuid;

pub const INSUFFICIENT_PERMISSIONS: &str =
    "Insufficient permissions. This action requires elevated privileges.";

pub const USER_ROLES: &[Role] = &[Role::User, Role::Admin, Role::Superadmin];
pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::Superadmin];
pub const SUPERADMIN_ROLES: &[Role] = &[Role::Superadmin];

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub role: Role,
}

impl From<UserProfile> for AuthUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            fullname: profile.fullname,
            email: profile.email,
            role: profile.role,
        }
    }
}

impl From<AuthUser> for UserProfile {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            role: user.role,
        }
    }
}

/// The raw access token the request was authenticated with
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header is missing or malformed".to_string())
        })
}

/// Request gate
///
/// Verifies the bearer token (revocation-aware unless
/// `auth.gate_checks_revocation` is off), re-resolves the user by the
/// token's email and attaches `AuthUser` and `BearerToken`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.to_string();

    let user = state
        .auth()
        .authenticate(&token, state.config().auth.gate_checks_revocation)
        .await
        .map_err(|e| {
            debug!(reason = %e, path = %request.uri().path(), "Request rejected by auth gate");
            e
        })?;

    request.extensions_mut().insert(AuthUser::from(user));
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

/// Type alias for role middleware future
type RoleMiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;

/// Role gate. Must run after `auth_middleware`.
///
/// ```ignore
/// Router::new()
///     .route("/", post(create))
///     .route_layer(middleware::from_fn(require_roles(ADMIN_ROLES)))
///     .route_layer(middleware::from_fn_with_state(state, auth_middleware));
/// ```
pub fn require_roles(
    allowed: &'static [Role],
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let user = request
                .extensions()
                .get::<AuthUser>()
                .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

            if !allowed.contains(&user.role) {
                warn!(
                    user_id = %user.id,
                    role = %user.role,
                    path = %request.uri().path(),
                    "Access denied"
                );
                return Err(ApiError::Forbidden(INSUFFICIENT_PERMISSIONS.to_string()));
            }

            Ok(next.run(request).await)
        })
    }
}
