//! Health probes
//!
//! `/health` and `/health/live` answer as long as the process serves
//! requests. `/health/ready` also runs `SELECT 1` and turns 503 when the
//! database is unreachable. None of them pass through the auth gate.

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseStatus>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn static_probe(status: &'static str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database: None,
    })
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    static_probe("healthy")
}

/// GET /health/live
pub async fn liveness_check() -> Json<HealthResponse> {
    static_probe("alive")
}

/// GET /health/ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match db::health_check(state.db()).await {
        Ok(()) => (
            StatusCode::OK,
            DatabaseStatus {
                reachable: true,
                error: None,
            },
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            DatabaseStatus {
                reachable: false,
                error: Some("database unreachable".to_string()),
            },
        ),
    };

    let label = if status == StatusCode::OK { "ready" } else { "not_ready" };
    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            database: Some(database),
        }),
    )
}
