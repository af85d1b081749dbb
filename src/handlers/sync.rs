//! # Sync Trigger Handlers
//!
//! The on-demand HTTP triggers for the sync core: a full run across all
//! connections (cron-style, shared-secret guarded) and a single-shop sync.
//! Both endpoints answer structured JSON with a boolean success flag and
//! never surface a per-connection failure as a transport error.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::SyncAuth;
use crate::media_sync::MediaSyncStats;
use crate::models::connection::TokenState;
use crate::orchestrator::RunReport;
use crate::server::AppState;

/// Successful run response for the cron trigger
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncRunResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: RunReport,
    pub timestamp: String,
}

/// Error envelope shared by the sync triggers
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncErrorResponse {
    pub success: bool,
    pub error: String,
    pub timestamp: String,
}

impl SyncErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Per-shop sync response
#[derive(Debug, Serialize, ToSchema)]
pub struct ShopSyncResponse {
    pub success: bool,
    pub message: String,
    pub stats: ShopSyncStats,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopSyncStats {
    pub total_media: usize,
    pub images: usize,
    pub videos: usize,
}

impl From<MediaSyncStats> for ShopSyncStats {
    fn from(stats: MediaSyncStats) -> Self {
        Self {
            total_media: stats.count,
            images: stats.images,
            videos: stats.videos,
        }
    }
}

/// Run the orchestrator across all connections
#[utoipa::path(
    post,
    path = "/api/sync/run",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Run report", body = SyncRunResponse),
        (status = 401, description = "Invalid shared secret"),
        (status = 500, description = "Top-level run failure", body = SyncErrorResponse)
    ),
    tag = "sync"
)]
pub async fn run_sync(State(state): State<AppState>, _auth: SyncAuth) -> Response {
    match state.orchestrator().run().await {
        Ok(report) => {
            let message = if report.total_shops == 0 {
                "No shops to sync".to_string()
            } else {
                report.summary()
            };
            Json(SyncRunResponse {
                success: true,
                message,
                report,
                timestamp: Utc::now().to_rfc3339(),
            })
            .into_response()
        }
        Err(err) => {
            error!(error = %err, "Sync run failed at top level");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncErrorResponse::new(err.to_string())),
            )
                .into_response()
        }
    }
}

/// Synchronously sync a single shop's connection
#[utoipa::path(
    post,
    path = "/api/shops/{shop}/sync",
    security(("bearer_auth" = [])),
    params(("shop" = String, Path, description = "Shop domain")),
    responses(
        (status = 200, description = "Sync stats", body = ShopSyncResponse),
        (status = 404, description = "No connection for this shop", body = SyncErrorResponse),
        (status = 409, description = "Token expired, merchant must reconnect", body = SyncErrorResponse),
        (status = 500, description = "Sync failed", body = SyncErrorResponse)
    ),
    tag = "sync"
)]
pub async fn shop_sync(
    State(state): State<AppState>,
    _auth: SyncAuth,
    Path(shop): Path<String>,
) -> Response {
    let connections = state.connection_repo();

    let connection = match connections.find_by_shop(&shop).await {
        Ok(Some(connection)) => connection,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(SyncErrorResponse::new("Instagram account not connected")),
            )
                .into_response();
        }
        Err(err) => {
            error!(shop = %shop, error = %err, "Failed to load connection");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncErrorResponse::new("Failed to load connection")),
            )
                .into_response();
        }
    };

    let token = match connection.token_state() {
        TokenState::Valid(token) => token.to_string(),
        TokenState::Invalid => {
            return (
                StatusCode::CONFLICT,
                Json(SyncErrorResponse::new(
                    "Token expired - merchant needs to reconnect Instagram",
                )),
            )
                .into_response();
        }
    };

    match state
        .orchestrator()
        .sync_connection(&connection, &token)
        .await
    {
        Ok(stats) => Json(ShopSyncResponse {
            success: true,
            message: format!("Successfully synced {} media items", stats.count),
            stats: stats.into(),
        })
        .into_response(),
        Err(err) => {
            error!(shop = %shop, error = %err, "Manual shop sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncErrorResponse::new(err.to_string())),
            )
                .into_response()
        }
    }
}
