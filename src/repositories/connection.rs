//! Connection repository for database operations
//!
//! Encapsulates SeaORM operations for the instagram_connections table:
//! shop-keyed upsert, profile/token updates, and the best-effort sentinel
//! write performed when the provider reports a revoked token.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::connection::{self, Entity as Connection, INVALID_TOKEN_SENTINEL};

/// Fields stored when a shop completes the OAuth exchange.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub instagram_account_id: String,
    pub access_token: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub media_count: i32,
    pub token_expires_at: DateTime<Utc>,
}

/// Repository for connection database operations
#[derive(Debug, Clone)]
pub struct ConnectionRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ConnectionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Load every connection, ordered by connected_at so a run processes
    /// shops in a stable order.
    pub async fn list_all(&self) -> Result<Vec<connection::Model>> {
        Connection::find()
            .order_by_asc(connection::Column::ConnectedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to load connections: {e}"))
    }

    pub async fn find_by_shop(&self, shop: &str) -> Result<Option<connection::Model>> {
        Connection::find()
            .filter(connection::Column::Shop.eq(shop))
            .one(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to load connection for {shop}: {e}"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<connection::Model>> {
        Connection::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to load connection {id}: {e}"))
    }

    /// Create or replace the connection for a shop. At most one row per
    /// shop exists; reconnecting overwrites the credential and profile.
    pub async fn upsert_for_shop(
        &self,
        shop: &str,
        new: NewConnection,
    ) -> Result<connection::Model> {
        let now = Utc::now();

        match self.find_by_shop(shop).await? {
            Some(existing) => {
                let mut active: connection::ActiveModel = existing.into();
                active.instagram_account_id = Set(new.instagram_account_id);
                active.access_token = Set(new.access_token);
                active.username = Set(new.username);
                active.profile_picture_url = Set(new.profile_picture_url);
                active.followers_count = Set(0);
                active.media_count = Set(new.media_count);
                active.token_expires_at = Set(new.token_expires_at.into());
                active.connected_at = Set(now.into());
                active.updated_at = Set(now.into());
                active
                    .update(self.db.as_ref())
                    .await
                    .map_err(|e| anyhow!("failed to update connection for {shop}: {e}"))
            }
            None => {
                let active = connection::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    shop: Set(shop.to_string()),
                    instagram_account_id: Set(new.instagram_account_id),
                    access_token: Set(new.access_token),
                    username: Set(new.username),
                    profile_picture_url: Set(new.profile_picture_url),
                    followers_count: Set(0),
                    media_count: Set(new.media_count),
                    token_expires_at: Set(new.token_expires_at.into()),
                    connected_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                active
                    .insert(self.db.as_ref())
                    .await
                    .map_err(|e| anyhow!("failed to insert connection for {shop}: {e}"))
            }
        }
    }

    /// Persist refreshed profile fields after a successful sync.
    pub async fn update_profile(
        &self,
        connection_id: Uuid,
        username: &str,
        profile_picture_url: Option<&str>,
        media_count: i32,
    ) -> Result<()> {
        let active = connection::ActiveModel {
            id: Set(connection_id),
            username: Set(username.to_string()),
            profile_picture_url: Set(profile_picture_url.map(str::to_string)),
            media_count: Set(media_count),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to update profile for {connection_id}: {e}"))?;
        Ok(())
    }

    /// Persist a freshly exchanged token and its expiry.
    pub async fn update_token(
        &self,
        connection_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let active = connection::ActiveModel {
            id: Set(connection_id),
            access_token: Set(access_token.to_string()),
            token_expires_at: Set(expires_at.into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to update token for {connection_id}: {e}"))?;
        Ok(())
    }

    /// Write the invalid-token sentinel so subsequent runs skip this
    /// connection without any network call.
    pub async fn mark_token_invalid(&self, connection_id: Uuid) -> Result<()> {
        let active = connection::ActiveModel {
            id: Set(connection_id),
            access_token: Set(INVALID_TOKEN_SENTINEL.to_string()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to mark token invalid for {connection_id}: {e}"))?;
        Ok(())
    }

    /// Delete a shop's connection. Media and feed settings go with it via
    /// FK cascade. Returns whether a row existed.
    pub async fn delete_by_shop(&self, shop: &str) -> Result<bool> {
        let result = Connection::delete_many()
            .filter(connection::Column::Shop.eq(shop))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to delete connection for {shop}: {e}"))?;
        Ok(result.rows_affected > 0)
    }
}
