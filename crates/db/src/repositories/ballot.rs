//! Ballot repository.

use std::sync::Arc;

use crate::entities::{Ballot, User, ballot, user};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr, sea_query::OnConflict,
};

/// Per-choice ballot counts for one vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChoiceCounts {
    pub approve: u64,
    pub reject: u64,
    pub abstain: u64,
}

/// Ballot repository for database operations.
#[derive(Clone)]
pub struct BallotRepository {
    db: Arc<DatabaseConnection>,
}

/// Whether a database error is the `(vote_id, user_id)` uniqueness violation.
#[must_use]
pub fn is_duplicate_ballot(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl BallotRepository {
    /// Create a new ballot repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the ballot for a (vote, user) pair on the given connection.
    pub async fn find_by_pair_in<C>(
        conn: &C,
        vote_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ballot::Model>>
    where
        C: ConnectionTrait,
    {
        Ballot::find()
            .filter(ballot::Column::VoteId.eq(vote_id))
            .filter(ballot::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a ballot, mapping the uniqueness violation to [`AppError::AlreadyVoted`].
    pub async fn insert_unique_in<C>(
        conn: &C,
        model: ballot::ActiveModel,
    ) -> AppResult<ballot::Model>
    where
        C: ConnectionTrait,
    {
        let vote_id = model.vote_id.clone().take().unwrap_or_default();
        model.insert(conn).await.map_err(|e| {
            if is_duplicate_ballot(&e) {
                AppError::AlreadyVoted(vote_id)
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Insert a ballot unless one already exists for the pair.
    ///
    /// Returns `true` when a row was written.
    pub async fn insert_if_absent_in<C>(conn: &C, model: ballot::ActiveModel) -> AppResult<bool>
    where
        C: ConnectionTrait,
    {
        let inserted = Ballot::insert(model)
            .on_conflict(
                OnConflict::columns([ballot::Column::VoteId, ballot::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Tally ballots by choice.
    pub async fn count_by_choice(&self, vote_id: &str) -> AppResult<ChoiceCounts> {
        let rows: Vec<(String, i64)> = Ballot::find()
            .select_only()
            .column(ballot::Column::VoteChoice)
            .column_as(ballot::Column::Id.count(), "votes_count")
            .filter(ballot::Column::VoteId.eq(vote_id))
            .group_by(ballot::Column::VoteChoice)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut counts = ChoiceCounts::default();
        for (choice, count) in rows {
            let count = count.max(0) as u64;
            match choice.as_str() {
                "approve" => counts.approve = count,
                "reject" => counts.reject = count,
                "abstain" => counts.abstain = count,
                other => {
                    tracing::warn!(vote_id, choice = other, "Ignoring unknown ballot choice");
                }
            }
        }
        Ok(counts)
    }

    /// Ballots of a vote joined with their voters, in ballot-id order.
    pub async fn find_by_vote_with_voters(
        &self,
        vote_id: &str,
    ) -> AppResult<Vec<(ballot::Model, Option<user::Model>)>> {
        Ballot::find()
            .find_also_related(User)
            .filter(ballot::Column::VoteId.eq(vote_id))
            .order_by_asc(ballot::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's ballots across the given votes.
    pub async fn find_by_user_in_votes(
        &self,
        user_id: &str,
        vote_ids: &[String],
    ) -> AppResult<Vec<ballot::Model>> {
        if vote_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ballot::find()
            .filter(ballot::Column::UserId.eq(user_id))
            .filter(ballot::Column::VoteId.is_in(vote_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All ballots of a vote.
    pub async fn find_by_vote(&self, vote_id: &str) -> AppResult<Vec<ballot::Model>> {
        Ballot::find()
            .filter(ballot::Column::VoteId.eq(vote_id))
            .order_by_asc(ballot::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::ballot::VoteChoice;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_ballot(id: &str, vote_id: &str, user_id: &str, choice: VoteChoice) -> ballot::Model {
        ballot::Model {
            id: id.to_string(),
            vote_id: vote_id.to_string(),
            user_id: user_id.to_string(),
            vote_choice: choice,
            vote_time: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_count_by_choice() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "vote_choice" => sea_orm::Value::String(Some(Box::new("approve".to_string()))),
                        "votes_count" => sea_orm::Value::BigInt(Some(3)),
                    },
                    maplit::btreemap! {
                        "vote_choice" => sea_orm::Value::String(Some(Box::new("abstain".to_string()))),
                        "votes_count" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let repo = BallotRepository::new(db);
        let counts = repo.count_by_choice("v1").await.unwrap();

        assert_eq!(
            counts,
            ChoiceCounts {
                approve: 3,
                reject: 0,
                abstain: 1
            }
        );
    }

    #[tokio::test]
    async fn test_find_by_pair_in_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ballot::Model>::new()])
            .into_connection();

        let result = BallotRepository::find_by_pair_in(&db, "v1", "u1").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_insert_if_absent_reports_skip() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let model = ballot::ActiveModel {
            id: Set("b1".to_string()),
            vote_id: Set("v1".to_string()),
            user_id: Set("u1".to_string()),
            vote_choice: Set(VoteChoice::Abstain),
            vote_time: Set(Utc::now().into()),
        };

        let inserted = BallotRepository::insert_if_absent_in(&db, model).await.unwrap();
        assert!(!inserted);
    }

    #[tokio::test]
    async fn test_find_by_vote() {
        let b1 = create_test_ballot("b1", "v1", "u1", VoteChoice::Approve);
        let b2 = create_test_ballot("b2", "v1", "u2", VoteChoice::Reject);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[b1, b2]])
                .into_connection(),
        );

        let repo = BallotRepository::new(db);
        let ballots = repo.find_by_vote("v1").await.unwrap();

        assert_eq!(ballots.len(), 2);
        assert_eq!(ballots[1].vote_choice, VoteChoice::Reject);
    }
}
