//! Vote registry: creation, lookup, listing and deletion of motions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::entities::vote;
use rollcall_db::repositories::VoteRepository;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::clock::Clock;
use crate::principal::TargetGroup;

/// Input for creating a vote.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVoteInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub target_group: Option<TargetGroup>,
}

/// Whether `vote` accepts attendance and ballots at `now`.
///
/// `start_time` is informational; a vote is open from creation until `end_time`.
#[must_use]
pub fn is_open(vote: &vote::Model, now: DateTime<Utc>) -> bool {
    now < vote.end_time.with_timezone(&Utc)
}

/// Vote registry service.
#[derive(Clone)]
pub struct VoteRegistry {
    vote_repo: VoteRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl VoteRegistry {
    /// Create a new vote registry.
    #[must_use]
    pub fn new(vote_repo: VoteRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            vote_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a vote.
    pub async fn create(&self, input: CreateVoteInput) -> AppResult<vote::Model> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        input.validate()?;

        if input.end_time <= input.start_time {
            return Err(AppError::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }

        let target_group = input.target_group.unwrap_or_default();
        if target_group.as_str().trim().is_empty() {
            return Err(AppError::Validation(
                "target_group must not be blank".to_string(),
            ));
        }
        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description.unwrap_or_default()),
            start_time: Set(input.start_time.fixed_offset()),
            end_time: Set(input.end_time.fixed_offset()),
            is_anonymous: Set(input.is_anonymous),
            target_group: Set(target_group.into()),
            created_at: Set(self.clock.now().fixed_offset()),
        };

        let vote = self.vote_repo.create(model).await?;
        info!(vote_id = %vote.id, target_group = %vote.target_group, "Vote created");
        Ok(vote)
    }

    /// Get a vote by ID.
    pub async fn get(&self, vote_id: &str) -> AppResult<vote::Model> {
        self.vote_repo.get_by_id(vote_id).await
    }

    /// Delete a vote together with its attendance and ballots.
    pub async fn delete(&self, vote_id: &str) -> AppResult<()> {
        self.vote_repo.delete_cascade(vote_id).await?;
        info!(vote_id, "Vote deleted");
        Ok(())
    }

    /// Whether the vote is open right now.
    #[must_use]
    pub fn is_open(&self, vote: &vote::Model) -> bool {
        is_open(vote, self.clock.now())
    }

    /// All votes, newest first.
    pub async fn list(&self) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_all_newest_first().await
    }

    /// Open votes, soonest-closing first.
    pub async fn list_active(&self) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_open(self.clock.now()).await
    }

    /// Total number of votes.
    pub async fn count(&self) -> AppResult<u64> {
        self.vote_repo.count().await
    }

    /// Current time as seen by the registry.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
