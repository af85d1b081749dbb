//! Feed settings repository for database operations
//!
//! Settings are created with defaults at connect time and only mutated by
//! explicit merchant configuration; the sync core reads them read-only.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::feed_settings::{self, Entity as FeedSettings, SettingsPatch};

/// Repository for feed settings database operations
#[derive(Debug, Clone)]
pub struct FeedSettingsRepository {
    pub db: Arc<DatabaseConnection>,
}

impl FeedSettingsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_shop(&self, shop: &str) -> Result<Option<feed_settings::Model>> {
        FeedSettings::find()
            .filter(feed_settings::Column::Shop.eq(shop))
            .one(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to load feed settings for {shop}: {e}"))
    }

    /// Create default settings for a shop, or re-point an existing row at
    /// a reconnected connection.
    pub async fn ensure_defaults(
        &self,
        shop: &str,
        connection_id: Uuid,
    ) -> Result<feed_settings::Model> {
        match self.find_by_shop(shop).await? {
            Some(existing) => {
                let mut active: feed_settings::ActiveModel = existing.into();
                active.connection_id = Set(connection_id);
                active.updated_at = Set(Utc::now().into());
                active
                    .update(self.db.as_ref())
                    .await
                    .map_err(|e| anyhow!("failed to relink feed settings for {shop}: {e}"))
            }
            None => feed_settings::default_active_model(shop, connection_id)
                .insert(self.db.as_ref())
                .await
                .map_err(|e| anyhow!("failed to create feed settings for {shop}: {e}")),
        }
    }

    /// Apply a validated partial update. Returns `None` when the shop has
    /// no settings row.
    pub async fn apply_patch(
        &self,
        shop: &str,
        patch: &SettingsPatch,
    ) -> Result<Option<feed_settings::Model>> {
        let Some(existing) = self.find_by_shop(shop).await? else {
            return Ok(None);
        };

        let mut active: feed_settings::ActiveModel = existing.into();
        if let Some(value) = &patch.feed_title {
            active.feed_title = Set(value.clone());
        }
        if let Some(value) = &patch.media_filter {
            active.media_filter = Set(value.clone());
        }
        if let Some(value) = &patch.on_post_click {
            active.on_post_click = Set(value.clone());
        }
        if let Some(value) = &patch.post_spacing {
            active.post_spacing = Set(value.clone());
        }
        if let Some(value) = &patch.rounded_corners {
            active.rounded_corners = Set(value.clone());
        }
        if let Some(value) = &patch.layout {
            active.layout = Set(value.clone());
        }
        if let Some(value) = &patch.format {
            active.format = Set(value.clone());
        }
        if let Some(value) = &patch.responsive_layout {
            active.responsive_layout = Set(value.clone());
        }
        if let Some(value) = &patch.slider_behavior {
            active.slider_behavior = Set(value.clone());
        }
        if let Some(value) = patch.grid_columns {
            active.grid_columns = Set(value);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to update feed settings for {shop}: {e}"))?;
        Ok(Some(updated))
    }
}
