//! Create vote (motion) table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Vote::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Vote::Description).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Vote::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vote::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vote::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Vote::TargetGroup)
                            .string_len(128)
                            .not_null()
                            .default("ALL"),
                    )
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: end_time (open window filter and the sweeper scan)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_end_time")
                    .table(Vote::Table)
                    .col(Vote::EndTime)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (history listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_created_at")
                    .table(Vote::Table)
                    .col(Vote::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    Title,
    Description,
    StartTime,
    EndTime,
    IsAnonymous,
    TargetGroup,
    CreatedAt,
}
