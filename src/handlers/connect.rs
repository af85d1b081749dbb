//! # Connect / Disconnect Handlers
//!
//! The OAuth callback that creates a shop's connection, and the disconnect
//! endpoint removing it (media and settings follow via FK cascade).
//!
//! The callback always ends in a redirect back to the merchant's admin,
//! carrying a success or error flag in the query string.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use crate::auth::SyncAuth;
use crate::error::{ApiError, ErrorType};
use crate::repositories::connection::NewConnection;
use crate::server::AppState;

/// Fallback token lifetime when the provider omits `expires_in` (60 days).
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 60 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Shop domain, threaded through the OAuth round trip
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_reason: Option<String>,
    #[allow(dead_code)]
    pub error_description: Option<String>,
}

/// Instagram OAuth callback
#[utoipa::path(
    get,
    path = "/instagram/callback",
    params(
        ("state" = Option<String>, Query, description = "Shop domain"),
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("error" = Option<String>, Query, description = "Provider error code")
    ),
    responses(
        (status = 303, description = "Redirect back to the merchant admin"),
        (status = 400, description = "Missing shop state", body = ApiError)
    ),
    tag = "connect"
)]
pub async fn instagram_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    // Without the shop we cannot build the return URL, so this is the one
    // path that cannot redirect.
    let Some(shop) = query.state.filter(|s| !s.is_empty()) else {
        warn!("Instagram callback without shop state");
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Missing shop parameter in state",
        ));
    };

    let store_handle = shop.replace(".myshopify.com", "");
    let admin_url = format!(
        "https://admin.shopify.com/store/{}/apps/{}/app",
        store_handle, state.config.app_handle
    );

    if let Some(provider_error) = query.error {
        warn!(
            shop = %shop,
            error = %provider_error,
            reason = query.error_reason.as_deref().unwrap_or(""),
            "Instagram OAuth denied"
        );
        let reason = query.error_reason.unwrap_or(provider_error);
        return Ok(admin_redirect(
            &admin_url,
            &[("error", "instagram_auth_failed"), ("reason", &reason)],
        ));
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Ok(admin_redirect(&admin_url, &[("error", "no_auth_code")]));
    };

    match connect_shop(&state, &shop, &code).await {
        Ok(()) => Ok(admin_redirect(
            &admin_url,
            &[("instagram_connected", "true")],
        )),
        Err(err) => {
            error!(shop = %shop, error = %err, "Instagram connect failed");
            Ok(admin_redirect(
                &admin_url,
                &[("error", "processing_failed"), ("message", &err.to_string())],
            ))
        }
    }
}

/// Token exchange, connection upsert, default settings and initial sync.
async fn connect_shop(state: &AppState, shop: &str, code: &str) -> anyhow::Result<()> {
    let client = &state.instagram;

    let short_lived = client.exchange_code(code).await?;
    let long_lived = client.exchange_long_lived(&short_lived.access_token).await?;
    let details = client.account_details(&long_lived.access_token).await?;

    let lifetime = long_lived
        .expires_in
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
    let token_expires_at = Utc::now() + Duration::seconds(lifetime);

    let connection = state
        .connection_repo()
        .upsert_for_shop(
            shop,
            NewConnection {
                instagram_account_id: details.id.clone(),
                access_token: long_lived.access_token.clone(),
                username: details.username.clone(),
                profile_picture_url: details.profile_picture_url.clone(),
                media_count: details.media_count,
                token_expires_at,
            },
        )
        .await?;

    info!(shop = %shop, username = %details.username, "Instagram account connected");

    // Default settings and initial sync are best-effort: the connection is
    // live either way, and the next scheduled run backfills the media.
    if let Err(err) = state
        .feed_settings_repo()
        .ensure_defaults(shop, connection.id)
        .await
    {
        error!(shop = %shop, error = %err, "Failed to create default feed settings");
    }

    match state
        .orchestrator()
        .sync_connection(&connection, &long_lived.access_token)
        .await
    {
        Ok(stats) => info!(
            shop = %shop,
            count = stats.count,
            images = stats.images,
            videos = stats.videos,
            "Initial media sync complete"
        ),
        Err(err) => error!(shop = %shop, error = %err, "Initial media sync failed"),
    }

    Ok(())
}

fn admin_redirect(admin_url: &str, params: &[(&str, &str)]) -> Response {
    let url = match Url::parse(admin_url) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(params);
            url.to_string()
        }
        Err(_) => admin_url.to_string(),
    };
    Redirect::to(&url).into_response()
}

/// Remove a shop's connection (media and settings cascade)
#[utoipa::path(
    delete,
    path = "/api/shops/{shop}/connection",
    security(("bearer_auth" = [])),
    params(("shop" = String, Path, description = "Shop domain")),
    responses(
        (status = 204, description = "Connection removed"),
        (status = 404, description = "No connection for this shop", body = ApiError)
    ),
    tag = "connect"
)]
pub async fn disconnect(
    State(state): State<AppState>,
    _auth: SyncAuth,
    Path(shop): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .connection_repo()
        .delete_by_shop(&shop)
        .await
        .map_err(ApiError::from)?;

    if removed {
        info!(shop = %shop, "Instagram connection removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ErrorType::NotFound.into())
    }
}
