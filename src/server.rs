//! # Server Configuration
//!
//! This module contains the server setup and configuration for the
//! Instafeed API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::sync_auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::instagram::InstagramClient;
use crate::orchestrator::SyncOrchestrator;
use crate::repositories::{ConnectionRepository, FeedSettingsRepository, MediaRepository};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub instagram: InstagramClient,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        let instagram = InstagramClient::from_config(&config);
        Self {
            db,
            config,
            instagram,
        }
    }

    pub fn connection_repo(&self) -> ConnectionRepository {
        ConnectionRepository::new(Arc::new(self.db.clone()))
    }

    pub fn media_repo(&self) -> MediaRepository {
        MediaRepository::new(Arc::new(self.db.clone()))
    }

    pub fn feed_settings_repo(&self) -> FeedSettingsRepository {
        FeedSettingsRepository::new(Arc::new(self.db.clone()))
    }

    pub fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(
            Arc::new(self.db.clone()),
            self.instagram.clone(),
            &self.config.sync,
        )
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    // The storefront widget loads the feed cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers(Any);

    let protected = Router::new()
        .route("/api/sync/run", post(handlers::sync::run_sync))
        .route("/api/shops/{shop}/sync", post(handlers::sync::shop_sync))
        .route(
            "/api/shops/{shop}/connection",
            delete(handlers::connect::disconnect),
        )
        .route(
            "/api/shops/{shop}/settings",
            get(handlers::settings::get_settings).patch(handlers::settings::update_settings),
        )
        .route_layer(middleware::from_fn_with_state(config, sync_auth_middleware));

    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/instagram/callback",
            get(handlers::connect::instagram_callback),
        )
        .route("/api/feed/{shop}", get(handlers::feed::get_feed).layer(cors));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(Arc::new(config), db);
    let app = create_app(state.clone());

    let addr = state
        .config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, profile = %state.config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::sync::run_sync,
        crate::handlers::sync::shop_sync,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,
        crate::handlers::feed::get_feed,
        crate::handlers::connect::instagram_callback,
        crate::handlers::connect::disconnect,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::sync::SyncRunResponse,
            crate::handlers::sync::SyncErrorResponse,
            crate::handlers::sync::ShopSyncResponse,
            crate::handlers::sync::ShopSyncStats,
            crate::handlers::settings::FeedSettingsView,
            crate::handlers::feed::FeedResponse,
            crate::handlers::feed::FeedMediaItem,
            crate::handlers::feed::FeedErrorResponse,
            crate::models::feed_settings::SettingsPatch,
            crate::media_sync::MediaSyncStats,
            crate::orchestrator::RunReport,
            crate::orchestrator::ShopOutcome,
            crate::orchestrator::SyncOutcome,
        )
    ),
    info(
        title = "Instafeed API",
        description = "Instagram feed sync and delivery for Shopify storefronts",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
