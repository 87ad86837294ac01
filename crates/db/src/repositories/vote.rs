//! Vote repository.

use std::sync::Arc;

use crate::entities::{Attendance, Ballot, Vote, attendance, ballot, vote};
use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>> {
        Vote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a vote by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<vote::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vote not found: {id}")))
    }

    /// Load a vote inside a transaction, holding a shared row lock until commit.
    ///
    /// A concurrent [`Self::delete_cascade`] waits for the holder to finish, so a
    /// ballot inserted under this lock is either committed before the delete
    /// (and removed by it) or never written.
    pub async fn find_for_share<C>(conn: &C, id: &str) -> AppResult<Option<vote::Model>>
    where
        C: ConnectionTrait,
    {
        Vote::find_by_id(id)
            .lock_shared()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All votes, newest first.
    pub async fn find_all_newest_first(&self) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .order_by_desc(vote::Column::CreatedAt)
            .order_by_desc(vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Votes whose window has not closed at `now`, soonest-closing first.
    pub async fn find_open(&self, now: DateTime<Utc>) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::EndTime.gt(now))
            .order_by_asc(vote::Column::EndTime)
            .order_by_asc(vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all votes.
    pub async fn count(&self) -> AppResult<u64> {
        Vote::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a vote together with its attendance and ballot rows.
    ///
    /// Runs in one transaction; nothing is removed when the vote is absent.
    pub async fn delete_cascade(&self, id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Take the vote row first so in-flight casts holding a shared lock drain.
        let exists = Vote::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some();
        if !exists {
            return Err(AppError::NotFound(format!("Vote not found: {id}")));
        }

        Ballot::delete_many()
            .filter(ballot::Column::VoteId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Attendance::delete_many()
            .filter(attendance::Column::VoteId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Vote::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
