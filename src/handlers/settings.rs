//! # Feed Settings Handlers
//!
//! Merchant-facing read/update of the per-shop widget configuration. The
//! sync core never mutates these; only the PATCH below does.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::SyncAuth;
use crate::error::{ApiError, ErrorType, validation_error};
use crate::models::feed_settings::{Model as FeedSettingsModel, SettingsPatch};
use crate::server::AppState;

/// Feed settings as exposed to the admin UI and the widget
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedSettingsView {
    pub feed_title: String,
    pub media_filter: String,
    pub on_post_click: String,
    pub post_spacing: String,
    pub rounded_corners: String,
    pub layout: String,
    pub format: String,
    pub responsive_layout: String,
    pub slider_behavior: String,
    pub grid_columns: i32,
}

impl From<FeedSettingsModel> for FeedSettingsView {
    fn from(model: FeedSettingsModel) -> Self {
        Self {
            feed_title: model.feed_title,
            media_filter: model.media_filter,
            on_post_click: model.on_post_click,
            post_spacing: model.post_spacing,
            rounded_corners: model.rounded_corners,
            layout: model.layout,
            format: model.format,
            responsive_layout: model.responsive_layout,
            slider_behavior: model.slider_behavior,
            grid_columns: model.grid_columns,
        }
    }
}

/// Fetch the feed settings for a shop
#[utoipa::path(
    get,
    path = "/api/shops/{shop}/settings",
    security(("bearer_auth" = [])),
    params(("shop" = String, Path, description = "Shop domain")),
    responses(
        (status = 200, description = "Feed settings", body = FeedSettingsView),
        (status = 404, description = "Shop has no settings", body = ApiError)
    ),
    tag = "settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    _auth: SyncAuth,
    Path(shop): Path<String>,
) -> Result<Json<FeedSettingsView>, ApiError> {
    let settings = state
        .feed_settings_repo()
        .find_by_shop(&shop)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::from(ErrorType::NotFound))?;

    Ok(Json(settings.into()))
}

/// Apply a partial settings update
#[utoipa::path(
    patch,
    path = "/api/shops/{shop}/settings",
    security(("bearer_auth" = [])),
    params(("shop" = String, Path, description = "Shop domain")),
    request_body = SettingsPatch,
    responses(
        (status = 200, description = "Updated settings", body = FeedSettingsView),
        (status = 400, description = "Invalid settings values", body = ApiError),
        (status = 404, description = "Shop has no settings", body = ApiError)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    _auth: SyncAuth,
    Path(shop): Path<String>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<FeedSettingsView>, ApiError> {
    if let Err(field_errors) = patch.validate() {
        return Err(validation_error("Invalid feed settings", field_errors));
    }

    let updated = state
        .feed_settings_repo()
        .apply_patch(&shop, &patch)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::from(ErrorType::NotFound))?;

    Ok(Json(updated.into()))
}
