//! Migration to create the instagram_connections table.
//!
//! One row per merchant shop, holding the linked Instagram account, its
//! long-lived access token and cached profile fields.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InstagramConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstagramConnections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InstagramConnections::Shop).text().not_null())
                    .col(
                        ColumnDef::new(InstagramConnections::InstagramAccountId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::AccessToken)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::Username)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::ProfilePictureUrl)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::FollowersCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::MediaCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::ConnectedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(InstagramConnections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one connection per shop
        manager
            .create_index(
                Index::create()
                    .name("idx_instagram_connections_shop")
                    .table(InstagramConnections::Table)
                    .col(InstagramConnections::Shop)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_instagram_connections_shop")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(InstagramConnections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InstagramConnections {
    Table,
    Id,
    Shop,
    InstagramAccountId,
    AccessToken,
    Username,
    ProfilePictureUrl,
    FollowersCount,
    MediaCount,
    TokenExpiresAt,
    ConnectedAt,
    UpdatedAt,
}
