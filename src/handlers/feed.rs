//! # Feed Delivery Handler
//!
//! Public endpoint consumed by the storefront widget. Returns the stored
//! media set in display order, filtered by the shop's media filter, plus
//! the settings block. Responses are cacheable for five minutes.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::handlers::settings::FeedSettingsView;
use crate::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedMediaItem {
    pub id: String,
    pub media_type: String,
    pub permalink: String,
    pub thumbnail_url: Option<String>,
    pub media_url: String,
    pub caption: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub settings: Option<FeedSettingsView>,
    pub media: Vec<FeedMediaItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedErrorResponse {
    pub error: String,
    pub media: Vec<FeedMediaItem>,
    pub settings: Option<FeedSettingsView>,
}

/// Deliver the feed for a shop's storefront widget
#[utoipa::path(
    get,
    path = "/api/feed/{shop}",
    params(("shop" = String, Path, description = "Shop domain")),
    responses(
        (status = 200, description = "Feed content", body = FeedResponse),
        (status = 404, description = "Shop not connected", body = FeedErrorResponse),
        (status = 500, description = "Lookup failed", body = FeedErrorResponse)
    ),
    tag = "feed"
)]
pub async fn get_feed(State(state): State<AppState>, Path(shop): Path<String>) -> Response {
    let connection = match state.connection_repo().find_by_shop(&shop).await {
        Ok(Some(connection)) => connection,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(FeedErrorResponse {
                    error: "Instagram not connected".to_string(),
                    media: Vec::new(),
                    settings: None,
                }),
            )
                .into_response();
        }
        Err(err) => {
            error!(shop = %shop, error = %err, "Failed to load connection for feed");
            return feed_error(err.to_string());
        }
    };

    let settings = match state.feed_settings_repo().find_by_shop(&shop).await {
        Ok(settings) => settings,
        Err(err) => {
            error!(shop = %shop, error = %err, "Failed to load feed settings");
            return feed_error(err.to_string());
        }
    };

    let media = match state.media_repo().list_for_connection(connection.id).await {
        Ok(media) => media,
        Err(err) => {
            error!(shop = %shop, error = %err, "Failed to load media for feed");
            return feed_error(err.to_string());
        }
    };

    let media_filter = settings
        .as_ref()
        .map(|s| s.media_filter.clone())
        .unwrap_or_else(|| "both".to_string());

    let media: Vec<FeedMediaItem> = media
        .into_iter()
        .filter(|item| match media_filter.as_str() {
            "images" => item.media_type == "IMAGE",
            "videos" => item.media_type == "VIDEO",
            _ => true,
        })
        .map(|item| FeedMediaItem {
            id: item.instagram_media_id,
            media_type: item.media_type,
            permalink: item.permalink,
            thumbnail_url: item.thumbnail_url,
            media_url: item.media_url,
            caption: item.caption,
            timestamp: item.taken_at,
        })
        .collect();

    let body = FeedResponse {
        success: true,
        username: connection.username,
        profile_picture_url: connection.profile_picture_url,
        settings: settings.map(FeedSettingsView::from),
        media,
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        "cache-control",
        HeaderValue::from_static("public, max-age=300"),
    );

    (headers, Json(body)).into_response()
}

fn feed_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FeedErrorResponse {
            error: message,
            media: Vec::new(),
            settings: None,
        }),
    )
        .into_response()
}
