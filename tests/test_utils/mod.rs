//! Test utilities for integration tests.
//!
//! Provides an in-memory SQLite database with migrations applied, fixture
//! inserts, and helpers wiring the sync core at a wiremock server.

use anyhow::Result;
use chrono::{Duration, Utc};
use instafeed::config::SyncConfig;
use instafeed::instagram::InstagramClient;
use instafeed::models::connection;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::{Value, json};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sync config suitable for tests: production defaults minus the pacing
/// delay, which would only slow the suite down.
pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        pacing_seconds: 0,
        ..SyncConfig::default()
    }
}

/// Instagram client pointed at a wiremock server for both base URLs.
#[allow(dead_code)]
pub fn client_for(mock_uri: &str) -> InstagramClient {
    InstagramClient::new(
        mock_uri.to_string(),
        mock_uri.to_string(),
        "test-client-id".to_string(),
        "test-client-secret".to_string(),
        format!("{mock_uri}/instagram/callback"),
    )
}

/// Insert a connection fixture. `connected_offset_minutes` staggers
/// connected_at so run ordering is deterministic (smaller = earlier).
#[allow(dead_code)]
pub async fn insert_connection(
    db: &DatabaseConnection,
    shop: &str,
    account_id: &str,
    access_token: &str,
    expires_in_days: i64,
    connected_offset_minutes: i64,
) -> Result<connection::Model> {
    let now = Utc::now();
    let model = connection::ActiveModel {
        id: Set(Uuid::new_v4()),
        shop: Set(shop.to_string()),
        instagram_account_id: Set(account_id.to_string()),
        access_token: Set(access_token.to_string()),
        username: Set(shop.split('.').next().unwrap_or("shop").to_string()),
        profile_picture_url: Set(None),
        followers_count: Set(0),
        media_count: Set(0),
        token_expires_at: Set((now + Duration::days(expires_in_days)).into()),
        connected_at: Set((now - Duration::minutes(1000 - connected_offset_minutes)).into()),
        updated_at: Set(now.into()),
    };
    Ok(model.insert(db).await?)
}

/// Provider-shaped media entry for mock responses.
#[allow(dead_code)]
pub fn media_entry(id: &str, media_type: &str) -> Value {
    json!({
        "id": id,
        "media_type": media_type,
        "media_url": format!("https://cdn.example/{id}.jpg"),
        "thumbnail_url": if media_type == "VIDEO" {
            Value::String(format!("https://cdn.example/{id}_thumb.jpg"))
        } else {
            Value::Null
        },
        "permalink": format!("https://www.instagram.com/p/{id}/"),
        "caption": format!("caption for {id}"),
        "timestamp": "2025-11-01T10:00:00+0000",
        "like_count": 7,
        "comments_count": 2
    })
}

/// Provider-shaped profile payload for mock responses.
#[allow(dead_code)]
pub fn account_details(id: &str, username: &str, media_count: i64) -> Value {
    json!({
        "id": id,
        "username": username,
        "account_type": "BUSINESS",
        "media_count": media_count,
        "profile_picture_url": format!("https://cdn.example/{username}.jpg")
    })
}

/// The provider's structured invalid-token error payload.
#[allow(dead_code)]
pub fn oauth_error_body() -> Value {
    json!({
        "error": {
            "message": "Error validating access token: Session has expired",
            "type": "OAuthException",
            "code": 190,
            "fbtrace_id": "AbCdEfGh"
        }
    })
}
