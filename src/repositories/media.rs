//! Media repository for database operations
//!
//! The media set for a connection is only ever written through
//! [`MediaRepository::replace_for_connection`]: a transactional
//! delete-all-then-insert-all keeping display order dense from 1.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::media::{self, Entity as Media, MediaKind};

/// One media item as prepared by the reconciler for storage.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub instagram_media_id: String,
    pub kind: MediaKind,
    pub permalink: String,
    pub media_url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub taken_at: String,
    pub like_count: i32,
    pub comments_count: i32,
}

/// Repository for media database operations
#[derive(Debug, Clone)]
pub struct MediaRepository {
    pub db: Arc<DatabaseConnection>,
}

impl MediaRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Replace the full media set for a connection inside one transaction.
    /// Items are stored with display order 1..N matching slice order.
    ///
    /// Callers must not invoke this with an empty slice; an empty remote
    /// response leaves the previous set untouched by contract.
    pub async fn replace_for_connection(
        &self,
        connection_id: Uuid,
        items: &[NewMedia],
    ) -> Result<()> {
        debug_assert!(!items.is_empty(), "empty replace would wipe live data");

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin media replace: {e}"))?;

        Media::delete_many()
            .filter(media::Column::ConnectionId.eq(connection_id))
            .exec(&txn)
            .await
            .map_err(|e| anyhow!("failed to delete previous media: {e}"))?;

        let now = Utc::now();
        for (index, item) in items.iter().enumerate() {
            let active = media::ActiveModel {
                id: Set(Uuid::new_v4()),
                connection_id: Set(connection_id),
                instagram_media_id: Set(item.instagram_media_id.clone()),
                media_type: Set(item.kind.as_str().to_string()),
                permalink: Set(item.permalink.clone()),
                media_url: Set(item.media_url.clone()),
                thumbnail_url: Set(item.thumbnail_url.clone()),
                caption: Set(item.caption.clone()),
                taken_at: Set(item.taken_at.clone()),
                like_count: Set(item.like_count),
                comments_count: Set(item.comments_count),
                views_count: Set(None),
                display_order: Set(index as i32 + 1),
                created_at: Set(now.into()),
            };
            active
                .insert(&txn)
                .await
                .map_err(|e| anyhow!("failed to insert media item: {e}"))?;
        }

        txn.commit()
            .await
            .map_err(|e| anyhow!("failed to commit media replace: {e}"))?;

        Ok(())
    }

    /// Stored media for a connection, in display order.
    pub async fn list_for_connection(&self, connection_id: Uuid) -> Result<Vec<media::Model>> {
        Media::find()
            .filter(media::Column::ConnectionId.eq(connection_id))
            .order_by_asc(media::Column::DisplayOrder)
            .all(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to list media for {connection_id}: {e}"))
    }

    pub async fn count_for_connection(&self, connection_id: Uuid) -> Result<u64> {
        Media::find()
            .filter(media::Column::ConnectionId.eq(connection_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| anyhow!("failed to count media for {connection_id}: {e}"))
    }
}
