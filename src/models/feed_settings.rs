//! Feed settings entity model
//!
//! Per-shop display configuration for the storefront feed widget. Rows are
//! created with defaults when a shop connects; the sync core only reads
//! them (media filter), merchants mutate them through the settings API.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feed_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Shop domain, unique across settings rows
    pub shop: String,

    /// Owning connection
    pub connection_id: Uuid,

    pub feed_title: String,

    /// "images" | "videos" | "both"
    pub media_filter: String,

    pub on_post_click: String,

    pub post_spacing: String,

    pub rounded_corners: String,

    pub layout: String,

    pub format: String,

    pub responsive_layout: String,

    pub slider_behavior: String,

    pub grid_columns: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
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

/// Allowed values per settings field.
pub const MEDIA_FILTER_VALUES: &[&str] = &["images", "videos", "both"];
pub const ON_POST_CLICK_VALUES: &[&str] = &[
    "detailed_popup",
    "minimal_popup",
    "go_to_instagram",
    "do_nothing",
];
pub const POST_SPACING_VALUES: &[&str] = &["small", "medium", "large", "none"];
pub const ROUNDED_CORNERS_VALUES: &[&str] = &["none", "small", "medium", "large"];
pub const LAYOUT_VALUES: &[&str] = &["slider", "grid"];
pub const FORMAT_VALUES: &[&str] = &["3:4", "4:5", "1:1", "9:16", "4:3", "circle"];
pub const RESPONSIVE_LAYOUT_VALUES: &[&str] = &["auto"];
pub const SLIDER_BEHAVIOR_VALUES: &[&str] = &["static", "auto_rotate"];

/// Partial settings update supplied by the merchant. Absent fields are
/// left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SettingsPatch {
    pub feed_title: Option<String>,
    pub media_filter: Option<String>,
    pub on_post_click: Option<String>,
    pub post_spacing: Option<String>,
    pub rounded_corners: Option<String>,
    pub layout: Option<String>,
    pub format: Option<String>,
    pub responsive_layout: Option<String>,
    pub slider_behavior: Option<String>,
    pub grid_columns: Option<i32>,
}

impl SettingsPatch {
    /// Validate every provided field against its closed value set,
    /// returning per-field errors as a JSON object when any are invalid.
    pub fn validate(&self) -> Result<(), serde_json::Value> {
        let mut errors = serde_json::Map::new();

        let checks: [(&str, &Option<String>, &[&str]); 8] = [
            ("media_filter", &self.media_filter, MEDIA_FILTER_VALUES),
            ("on_post_click", &self.on_post_click, ON_POST_CLICK_VALUES),
            ("post_spacing", &self.post_spacing, POST_SPACING_VALUES),
            (
                "rounded_corners",
                &self.rounded_corners,
                ROUNDED_CORNERS_VALUES,
            ),
            ("layout", &self.layout, LAYOUT_VALUES),
            ("format", &self.format, FORMAT_VALUES),
            (
                "responsive_layout",
                &self.responsive_layout,
                RESPONSIVE_LAYOUT_VALUES,
            ),
            (
                "slider_behavior",
                &self.slider_behavior,
                SLIDER_BEHAVIOR_VALUES,
            ),
        ];

        for (field, value, allowed) in checks {
            if let Some(value) = value
                && !allowed.contains(&value.as_str())
            {
                errors.insert(field.to_string(), json!(format!("invalid {field} value")));
            }
        }

        if let Some(columns) = self.grid_columns
            && !(1..=12).contains(&columns)
        {
            errors.insert(
                "grid_columns".to_string(),
                json!("grid_columns must be between 1 and 12"),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(serde_json::Value::Object(errors))
        }
    }
}

/// Default settings applied when a shop connects.
pub fn default_active_model(shop: &str, connection_id: Uuid) -> ActiveModel {
    use sea_orm::Set;
    let now = chrono::Utc::now();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        shop: Set(shop.to_string()),
        connection_id: Set(connection_id),
        feed_title: Set("Amazing Feed".to_string()),
        media_filter: Set("both".to_string()),
        on_post_click: Set("go_to_instagram".to_string()),
        post_spacing: Set("small".to_string()),
        rounded_corners: Set("none".to_string()),
        layout: Set("slider".to_string()),
        format: Set("3:4".to_string()),
        responsive_layout: Set("auto".to_string()),
        slider_behavior: Set("static".to_string()),
        grid_columns: Set(5),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}
