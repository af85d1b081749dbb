//! Media entity model
//!
//! One synced Instagram post. The full set for a connection is replaced on
//! every successful reconciliation; rows are never updated in place.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media kinds the sync stores. Albums and any future kinds are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "VIDEO")]
    Video,
}

impl MediaKind {
    /// Parse a provider media_type value; `None` for unsupported kinds.
    pub fn from_provider(value: &str) -> Option<Self> {
        match value {
            "IMAGE" => Some(Self::Image),
            "VIDEO" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "instagram_media")]
pub struct Model {
    /// Unique identifier for the stored row (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Owning connection
    pub connection_id: Uuid,

    /// Remote media identifier
    pub instagram_media_id: String,

    /// "IMAGE" or "VIDEO"
    pub media_type: String,

    /// Permalink to the post on Instagram
    pub permalink: String,

    /// Display URL of the media
    pub media_url: String,

    /// Thumbnail URL (videos only in practice)
    pub thumbnail_url: Option<String>,

    /// Post caption
    pub caption: Option<String>,

    /// Remote timestamp as reported by the provider
    pub taken_at: String,

    pub like_count: i32,

    pub comments_count: i32,

    pub views_count: Option<i32>,

    /// 1-based position matching remote fetch order
    pub display_order: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::connection::Entity",
        from = "Column::ConnectionId",
        to = "super::connection::Column::Id"
    )]
    Connection,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
