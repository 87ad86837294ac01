//! Create ballot table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ballot::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ballot::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Ballot::VoteId).string_len(32).not_null())
                    .col(ColumnDef::new(Ballot::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Ballot::VoteChoice).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Ballot::VoteTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_vote")
                            .from(Ballot::Table, Ballot::VoteId)
                            .to(Vote::Table, Vote::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_user")
                            .from(Ballot::Table, Ballot::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (vote_id, user_id) - one ballot per voter per vote.
        // Concurrent casts and sweeps race on this constraint.
        manager
            .create_index(
                Index::create()
                    .name("idx_ballot_vote_user")
                    .table(Ballot::Table)
                    .col(Ballot::VoteId)
                    .col(Ballot::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ballot::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Ballot {
    Table,
    Id,
    VoteId,
    UserId,
    VoteChoice,
    VoteTime,
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
