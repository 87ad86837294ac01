//! Attendance repository.

use std::sync::Arc;

use crate::entities::{Attendance, attendance, vote};
use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, sea_query::OnConflict,
};

/// Attendance repository for database operations.
#[derive(Clone)]
pub struct AttendanceRepository {
    db: Arc<DatabaseConnection>,
}

impl AttendanceRepository {
    /// Create a new attendance repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the attendance row for a (vote, user) pair.
    pub async fn find_by_pair(
        &self,
        vote_id: &str,
        user_id: &str,
    ) -> AppResult<Option<attendance::Model>> {
        Self::find_by_pair_in(self.db.as_ref(), vote_id, user_id).await
    }

    /// Find the attendance row for a (vote, user) pair on the given connection.
    pub async fn find_by_pair_in<C>(
        conn: &C,
        vote_id: &str,
        user_id: &str,
    ) -> AppResult<Option<attendance::Model>>
    where
        C: ConnectionTrait,
    {
        Attendance::find_by_id((vote_id.to_string(), user_id.to_string()))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert attendance, or refresh `attendance_time` when the row exists.
    ///
    /// A single statement, so repeated or concurrent registrations never fail.
    pub async fn upsert(&self, vote_id: &str, user_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        let model = attendance::ActiveModel {
            vote_id: Set(vote_id.to_string()),
            user_id: Set(user_id.to_string()),
            attendance_time: Set(now.fixed_offset()),
            has_voted: Set(false),
        };

        Attendance::insert(model)
            .on_conflict(
                OnConflict::columns([attendance::Column::VoteId, attendance::Column::UserId])
                    .update_column(attendance::Column::AttendanceTime)
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Flag the pair as having a ballot.
    pub async fn mark_voted_in<C>(conn: &C, vote_id: &str, user_id: &str) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = Attendance::update_many()
            .col_expr(
                attendance::Column::HasVoted,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(attendance::Column::VoteId.eq(vote_id))
            .filter(attendance::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count distinct attendees of a vote.
    pub async fn count_present(&self, vote_id: &str) -> AppResult<u64> {
        Attendance::find()
            .filter(attendance::Column::VoteId.eq(vote_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attendees of votes that closed before `now` and still have no ballot flag.
    pub async fn find_silent_after_close(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<attendance::Model>> {
        Attendance::find()
            .join(JoinType::InnerJoin, attendance::Relation::Vote.def())
            .filter(vote::Column::EndTime.lte(now))
            .filter(attendance::Column::HasVoted.eq(false))
            .order_by_asc(attendance::Column::VoteId)
            .order_by_asc(attendance::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's attendance rows across the given votes.
    pub async fn find_by_user_in_votes(
        &self,
        user_id: &str,
        vote_ids: &[String],
    ) -> AppResult<Vec<attendance::Model>> {
        if vote_ids.is_empty() {
            return Ok(Vec::new());
        }
        Attendance::find()
            .filter(attendance::Column::UserId.eq(user_id))
            .filter(attendance::Column::VoteId.is_in(vote_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_attendance(vote_id: &str, user_id: &str, has_voted: bool) -> attendance::Model {
        attendance::Model {
            vote_id: vote_id.to_string(),
            user_id: user_id.to_string(),
            attendance_time: Utc::now().into(),
            has_voted,
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let row = create_test_attendance("v1", "u1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row.clone()]])
                .into_connection(),
        );

        let repo = AttendanceRepository::new(db);
        let found = repo.find_by_pair("v1", "u1").await.unwrap().unwrap();

        assert_eq!(found.vote_id, "v1");
        assert!(!found.has_voted);
    }

    #[tokio::test]
    async fn test_upsert_executes_single_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AttendanceRepository::new(db);
        assert!(repo.upsert("v1", "u1", Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_count_present() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = AttendanceRepository::new(db);
        assert_eq!(repo.count_present("v1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_by_user_in_no_votes_skips_query() {
        // No results are queued; a query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = AttendanceRepository::new(db);
        let rows = repo.find_by_user_in_votes("u1", &[]).await.unwrap();

        assert!(rows.is_empty());
    }
}
