//! Authentication routes
//!
//! `login`, `register` and `refresh-token` are public. `me` and `logout`
//! sit behind the request gate.

use super::extractors::ValidJson;
use crate::auth::{auth_middleware, AuthUser, BearerToken};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use docvault_shared::{
    ApiResponse, LoginRequest, LoginResponse, LogoutRequest, MessageResponse,
    RefreshTokenRequest, RegisterRequest, RegisterResponse, TokenPair, UserProfile,
};

/// Create auth routes
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/refresh-token", post(refresh_token))
        .merge(protected)
}

/// POST /api/v1/auth/login
///
/// Password verification runs on the blocking thread pool.
async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth().login(&req).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    let created = state.auth().register(&req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// POST /api/v1/auth/refresh-token
///
/// Rotates the refresh token: the presented one is revoked and a fresh
/// pair is returned.
async fn refresh_token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshTokenRequest>,
) -> ApiResult<Json<ApiResponse<TokenPair>>> {
    let tokens = state.auth().refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// GET /api/v1/auth/me
async fn me(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = state.auth().me(&token).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    BearerToken(token): BearerToken,
    ValidJson(req): ValidJson<LogoutRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let message = state
        .auth()
        .logout(user.id, &token, &req.refresh_token)
        .await?;
    Ok(Json(ApiResponse::ok(message)))
}
