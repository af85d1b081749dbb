//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access.

pub mod connection;
pub mod feed_settings;
pub mod media;

pub use connection::ConnectionRepository;
pub use feed_settings::FeedSettingsRepository;
pub use media::MediaRepository;
