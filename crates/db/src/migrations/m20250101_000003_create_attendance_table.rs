//! Create attendance table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Attendance::VoteId).string_len(32).not_null())
                    .col(ColumnDef::new(Attendance::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Attendance::AttendanceTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attendance::HasVoted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_attendance")
                            .col(Attendance::VoteId)
                            .col(Attendance::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_vote")
                            .from(Attendance::Table, Attendance::VoteId)
                            .to(Vote::Table, Vote::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_user")
                            .from(Attendance::Table, Attendance::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: has_voted (sweeper scan for silent attendees)
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_has_voted")
                    .table(Attendance::Table)
                    .col(Attendance::HasVoted)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Attendance {
    Table,
    VoteId,
    UserId,
    AttendanceTime,
    HasVoted,
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
