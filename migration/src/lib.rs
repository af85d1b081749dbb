//! Database migrations for the Instafeed service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_11_10_090000_create_instagram_connections;
mod m2025_11_10_090100_create_instagram_media;
mod m2025_11_10_090200_create_feed_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_11_10_090000_create_instagram_connections::Migration),
            Box::new(m2025_11_10_090100_create_instagram_media::Migration),
            Box::new(m2025_11_10_090200_create_feed_settings::Migration),
        ]
    }
}
