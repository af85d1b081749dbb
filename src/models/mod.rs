//! # Data Models
//!
//! This module contains the SeaORM entities and shared value types used
//! throughout the Instafeed service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod connection;
pub mod feed_settings;
pub mod media;

pub use connection::Entity as Connection;
pub use feed_settings::Entity as FeedSettings;
pub use media::Entity as Media;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "instafeed".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
