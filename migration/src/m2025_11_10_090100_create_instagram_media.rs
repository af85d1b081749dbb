//! Migration to create the instagram_media table.
//!
//! Stores the synced media set for a connection. The whole set is replaced
//! on every successful reconciliation, so rows carry a dense display order
//! rather than any update timestamps.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InstagramMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstagramMedia::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InstagramMedia::ConnectionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstagramMedia::InstagramMediaId)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InstagramMedia::MediaType).text().not_null())
                    .col(ColumnDef::new(InstagramMedia::Permalink).text().not_null())
                    .col(ColumnDef::new(InstagramMedia::MediaUrl).text().not_null())
                    .col(ColumnDef::new(InstagramMedia::ThumbnailUrl).text().null())
                    .col(ColumnDef::new(InstagramMedia::Caption).text().null())
                    .col(ColumnDef::new(InstagramMedia::TakenAt).text().not_null())
                    .col(
                        ColumnDef::new(InstagramMedia::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InstagramMedia::CommentsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(InstagramMedia::ViewsCount).integer().null())
                    .col(
                        ColumnDef::new(InstagramMedia::DisplayOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstagramMedia::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_instagram_media_connection_id")
                            .from(InstagramMedia::Table, InstagramMedia::ConnectionId)
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
                    .name("idx_instagram_media_connection_order")
                    .table(InstagramMedia::Table)
                    .col(InstagramMedia::ConnectionId)
                    .col(InstagramMedia::DisplayOrder)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_instagram_media_connection_order")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(InstagramMedia::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InstagramMedia {
    Table,
    Id,
    ConnectionId,
    InstagramMediaId,
    MediaType,
    Permalink,
    MediaUrl,
    ThumbnailUrl,
    Caption,
    TakenAt,
    LikeCount,
    CommentsCount,
    ViewsCount,
    DisplayOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InstagramConnections {
    Table,
    Id,
}
