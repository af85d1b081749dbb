//! Connection entity model
//!
//! One row per merchant shop, linking it to an Instagram Business account
//! and holding the long-lived access token plus cached profile fields.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Reserved token value marking a connection whose token the provider has
/// permanently revoked. Consumers must check [`Model::token_state`] before
/// using the token.
pub const INVALID_TOKEN_SENTINEL: &str = "EXPIRED";

/// Semantic state of a stored access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState<'a> {
    /// A real token string the provider may still accept.
    Valid(&'a str),
    /// The sentinel: the token is known-revoked and must not be sent.
    Invalid,
}

/// Connection entity representing one shop's linked Instagram account
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "instagram_connections")]
pub struct Model {
    /// Unique identifier for the connection (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Shop domain, unique across connections
    pub shop: String,

    /// Remote Instagram account identifier
    pub instagram_account_id: String,

    /// Long-lived access token, or [`INVALID_TOKEN_SENTINEL`]
    pub access_token: String,

    /// Instagram username, refreshed on every successful sync
    pub username: String,

    /// Profile picture URL (optional)
    pub profile_picture_url: Option<String>,

    /// Follower count (informational, not refreshed by sync)
    pub followers_count: i32,

    /// Cached remote media count (informational)
    pub media_count: i32,

    /// When the current token expires
    pub token_expires_at: DateTimeWithTimeZone,

    /// When the shop first connected (or last re-connected)
    pub connected_at: DateTimeWithTimeZone,

    /// Timestamp of the last successful update to this row
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Resolve the semantic state of the stored token.
    pub fn token_state(&self) -> TokenState<'_> {
        if self.access_token == INVALID_TOKEN_SENTINEL {
            TokenState::Invalid
        } else {
            TokenState::Valid(&self.access_token)
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::media::Entity")]
    Media,
    #[sea_orm(has_one = "super::feed_settings::Entity")]
    FeedSettings,
}

impl Related<super::media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::feed_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedSettings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model_with_token(token: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            shop: "demo.myshopify.com".to_string(),
            instagram_account_id: "1789".to_string(),
            access_token: token.to_string(),
            username: "demo".to_string(),
            profile_picture_url: None,
            followers_count: 0,
            media_count: 0,
            token_expires_at: Utc::now().into(),
            connected_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn token_state_valid_for_real_token() {
        let model = model_with_token("IGQVJtoken");
        assert_eq!(model.token_state(), TokenState::Valid("IGQVJtoken"));
    }

    #[test]
    fn token_state_invalid_for_sentinel() {
        let model = model_with_token(INVALID_TOKEN_SENTINEL);
        assert_eq!(model.token_state(), TokenState::Invalid);
    }
}
