//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Instafeed API.

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;

pub mod connect;
pub mod feed;
pub mod settings;
pub mod sync;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness/readiness probe checking the database connection
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    crate::db::health_check(&state.db)
        .await
        .map_err(|_| crate::error::ErrorType::ServiceUnavailable.into())
        .map(|_| Json(serde_json::json!({ "status": "ok" })))
}
