//! Create story table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Story::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Story::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Story::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Story::Content).text().not_null())
                    .col(ColumnDef::new(Story::AuthorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Story::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Story::Votes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Story::AccessToken)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Story::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("public"),
                    )
                    .col(
                        ColumnDef::new(Story::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_author")
                            .from(Story::Table, Story::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (per-author listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_author_id")
                    .table(Story::Table)
                    .col(Story::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: (visibility, expires_at) - every public query filters on both
        manager
            .create_index(
                Index::create()
                    .name("idx_story_visibility_expires_at")
                    .table(Story::Table)
                    .col(Story::Visibility)
                    .col(Story::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (latest sort)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_created_at")
                    .table(Story::Table)
                    .col(Story::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: votes (popular sort)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_votes")
                    .table(Story::Table)
                    .col(Story::Votes)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Story::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
    Title,
    Content,
    AuthorId,
    ExpiresAt,
    Votes,
    AccessToken,
    Visibility,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
