//! Migration to create the feed_settings table.
//!
//! Per-shop display configuration for the storefront feed widget. Created
//! with defaults when a shop connects and mutated only by explicit merchant
//! configuration actions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeedSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeedSettings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeedSettings::Shop).text().not_null())
                    .col(ColumnDef::new(FeedSettings::ConnectionId).uuid().not_null())
                    .col(ColumnDef::new(FeedSettings::FeedTitle).text().not_null())
                    .col(ColumnDef::new(FeedSettings::MediaFilter).text().not_null())
                    .col(ColumnDef::new(FeedSettings::OnPostClick).text().not_null())
                    .col(ColumnDef::new(FeedSettings::PostSpacing).text().not_null())
                    .col(
                        ColumnDef::new(FeedSettings::RoundedCorners)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FeedSettings::Layout).text().not_null())
                    .col(ColumnDef::new(FeedSettings::Format).text().not_null())
                    .col(
                        ColumnDef::new(FeedSettings::ResponsiveLayout)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedSettings::SliderBehavior)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedSettings::GridColumns)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(FeedSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FeedSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_settings_connection_id")
                            .from(FeedSettings::Table, FeedSettings::ConnectionId)
                            .to(
                                InstagramConnections::Table,
                                InstagramConnections::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feed_settings_shop")
                    .table(FeedSettings::Table)
                    .col(FeedSettings::Shop)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_feed_settings_shop").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FeedSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FeedSettings {
    Table,
    Id,
    Shop,
    ConnectionId,
    FeedTitle,
    MediaFilter,
    OnPostClick,
    PostSpacing,
    RoundedCorners,
    Layout,
    Format,
    ResponsiveLayout,
    SliderBehavior,
    GridColumns,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum InstagramConnections {
    Table,
    Id,
}
