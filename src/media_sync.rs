//! # Media Reconciler
//!
//! Fetches the latest media page for a connection, filters it to supported
//! kinds and atomically replaces the stored set. An empty or irrelevant
//! remote response never touches persisted state: a transient provider
//! hiccup returning an empty page must not wipe a merchant's live feed.

use anyhow::Result;
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::instagram::{InstagramClient, MediaEntry};
use crate::models::media::MediaKind;
use crate::repositories::media::{MediaRepository, NewMedia};

/// Counts of media stored by one reconciliation.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct MediaSyncStats {
    /// Total items stored
    pub count: usize,
    pub images: usize,
    pub videos: usize,
}

/// Replaces a connection's stored media set from the provider.
#[derive(Debug, Clone)]
pub struct MediaReconciler {
    media_repo: MediaRepository,
    client: InstagramClient,
    page_limit: u32,
    max_items: usize,
}

impl MediaReconciler {
    pub fn new(media_repo: MediaRepository, client: InstagramClient, config: &SyncConfig) -> Self {
        Self {
            media_repo,
            client,
            page_limit: config.page_limit,
            max_items: config.max_items,
        }
    }

    /// Fetch, filter and store the media set for one connection.
    ///
    /// Returns zero counts without touching persisted state when the
    /// filtered remote set is empty. Any fetch failure propagates before
    /// the stored set is modified.
    pub async fn reconcile(
        &self,
        connection_id: Uuid,
        account_id: &str,
        access_token: &str,
    ) -> Result<MediaSyncStats> {
        let started = std::time::Instant::now();

        let entries = self
            .client
            .media_page(account_id, access_token, self.page_limit)
            .await?;
        debug!(
            connection_id = %connection_id,
            fetched = entries.len(),
            "Fetched media page"
        );

        let items: Vec<NewMedia> = entries
            .into_iter()
            .filter_map(to_storable)
            .take(self.max_items)
            .collect();

        if items.is_empty() {
            info!(
                connection_id = %connection_id,
                "No images or videos in remote response, keeping stored media"
            );
            return Ok(MediaSyncStats::default());
        }

        let stats = MediaSyncStats {
            count: items.len(),
            images: items
                .iter()
                .filter(|item| item.kind == MediaKind::Image)
                .count(),
            videos: items
                .iter()
                .filter(|item| item.kind == MediaKind::Video)
                .count(),
        };

        self.media_repo
            .replace_for_connection(connection_id, &items)
            .await?;

        counter!("media_sync_items_stored_total").increment(stats.count as u64);
        histogram!("media_sync_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

        info!(
            connection_id = %connection_id,
            count = stats.count,
            images = stats.images,
            videos = stats.videos,
            "Replaced stored media set"
        );

        Ok(stats)
    }
}

/// Convert a provider entry to a storable item; `None` for unsupported
/// kinds (albums and anything the provider adds later).
fn to_storable(entry: MediaEntry) -> Option<NewMedia> {
    let kind = MediaKind::from_provider(&entry.media_type)?;
    Some(NewMedia {
        instagram_media_id: entry.id,
        kind,
        permalink: entry.permalink,
        media_url: entry.media_url.unwrap_or_default(),
        thumbnail_url: entry.thumbnail_url,
        caption: entry.caption,
        taken_at: entry.timestamp,
        like_count: entry.like_count.unwrap_or(0),
        comments_count: entry.comments_count.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, media_type: &str) -> MediaEntry {
        MediaEntry {
            id: id.to_string(),
            media_type: media_type.to_string(),
            media_url: Some(format!("https://cdn.example/{id}.jpg")),
            thumbnail_url: None,
            permalink: format!("https://www.instagram.com/p/{id}/"),
            caption: None,
            timestamp: "2025-11-01T10:00:00+0000".to_string(),
            like_count: Some(3),
            comments_count: None,
        }
    }

    #[test]
    fn albums_are_not_storable() {
        assert!(to_storable(entry("a1", "CAROUSEL_ALBUM")).is_none());
    }

    #[test]
    fn images_and_videos_are_storable() {
        let image = to_storable(entry("i1", "IMAGE")).unwrap();
        assert_eq!(image.kind, MediaKind::Image);
        assert_eq!(image.like_count, 3);
        assert_eq!(image.comments_count, 0);

        let video = to_storable(entry("v1", "VIDEO")).unwrap();
        assert_eq!(video.kind, MediaKind::Video);
    }
}
