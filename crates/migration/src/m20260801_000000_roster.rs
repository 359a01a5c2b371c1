//! Initial schema migration - creates the roster table.
//!
//! One row per authorized identity:
//!
//! - `user_id`: external platform identity, primary key
//! - `username`: display label from the feed, mutable
//! - `channel_id`: linked support channel, NULL until provisioned
//! - `open`: whether the linked channel is in active conversation
//! - `active`: whether the feed currently authorizes this identity
//!
//! Rows are never deleted, only deactivated, so there is no down path
//! beyond dropping the table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Roster {
    Table,
    UserId,
    Username,
    ChannelId,
    Open,
    Active,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roster::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roster::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roster::Username).string().not_null())
                    .col(ColumnDef::new(Roster::ChannelId).big_integer())
                    .col(
                        ColumnDef::new(Roster::Open)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Roster::Active)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // One channel belongs to at most one entry.
        manager
            .create_index(
                Index::create()
                    .name("idx-roster-channel_id-unique")
                    .table(Roster::Table)
                    .col(Roster::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roster::Table).to_owned())
            .await
    }
}
