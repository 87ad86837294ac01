//! Ballot box: accepts exactly one ballot per (vote, principal).

use std::sync::Arc;

use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::entities::ballot::{self, VoteChoice};
use rollcall_db::repositories::{AttendanceRepository, BallotRepository, VoteRepository};
use sea_orm::{ActiveEnum, DatabaseConnection, Set, TransactionTrait};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::principal::Principal;
use crate::services::eligibility::is_eligible;
use crate::services::vote::is_open;

/// Parse a wire-level choice (`approve`, `reject` or `abstain`).
pub fn parse_choice(raw: &str) -> AppResult<VoteChoice> {
    VoteChoice::try_from_value(&raw.to_string())
        .map_err(|_| AppError::InvalidChoice(raw.to_string()))
}

/// Ballot box service.
#[derive(Clone)]
pub struct BallotBox {
    db: Arc<DatabaseConnection>,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl BallotBox {
    /// Create a new ballot box.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast `principal`'s ballot on a vote.
    ///
    /// Checks run in order: window open, choice valid, principal eligible,
    /// attendance registered, no earlier ballot. The whole cast runs in one
    /// transaction holding a shared lock on the vote row; the unique
    /// `(vote_id, user_id)` index settles concurrent casts, and the loser
    /// gets [`AppError::AlreadyVoted`].
    pub async fn cast(&self, vote_id: &str, principal: &Principal, choice: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let vote = VoteRepository::find_for_share(&txn, vote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vote not found: {vote_id}")))?;
        let now = self.clock.now();

        if !is_open(&vote, now) {
            return Err(AppError::VoteClosed(vote.id));
        }

        let choice = parse_choice(choice)?;

        if !is_eligible(&vote, principal) {
            return Err(AppError::NotEligible(format!(
                "{} is limited to {}",
                vote.id, vote.target_group
            )));
        }

        if AttendanceRepository::find_by_pair_in(&txn, &vote.id, &principal.id)
            .await?
            .is_none()
        {
            return Err(AppError::NotAttended(vote.id));
        }

        if BallotRepository::find_by_pair_in(&txn, &vote.id, &principal.id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyVoted(vote.id));
        }

        let model = ballot::ActiveModel {
            id: Set(self.id_gen.generate()),
            vote_id: Set(vote.id.clone()),
            user_id: Set(principal.id.clone()),
            vote_choice: Set(choice),
            vote_time: Set(now.fixed_offset()),
        };

        if let Err(e) = BallotRepository::insert_unique_in(&txn, model).await {
            if matches!(e, AppError::AlreadyVoted(_)) {
                debug!(vote_id, user_id = %principal.id, "Lost ballot race");
            }
            return Err(e);
        }
        AttendanceRepository::mark_voted_in(&txn, &vote.id, &principal.id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(vote_id, user_id = %principal.id, choice = %choice.to_value(), "Ballot cast");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{DateTime, Duration, Utc};
    use rollcall_db::entities::{attendance, user::Role, vote};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn principal(committee: Option<&str>) -> Principal {
        Principal {
            id: "u1".to_string(),
            username: "member1".to_string(),
            display_name: None,
            role: Role::Member,
            party: None,
            committee: committee.map(str::to_string),
        }
    }

    fn vote_model(group: &str, end: DateTime<Utc>) -> vote::Model {
        vote::Model {
            id: "v1".to_string(),
            title: "Motion".to_string(),
            description: String::new(),
            start_time: (end - Duration::minutes(1)).into(),
            end_time: end.into(),
            is_anonymous: false,
            target_group: group.to_string(),
            created_at: (end - Duration::minutes(1)).into(),
        }
    }

    fn ballot_box(db: MockDatabase, now: DateTime<Utc>) -> BallotBox {
        BallotBox::new(
            Arc::new(db.into_connection()),
            Arc::new(ManualClock::new(now)),
        )
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("approve").unwrap(), VoteChoice::Approve);
        assert_eq!(parse_choice("reject").unwrap(), VoteChoice::Reject);
        assert_eq!(parse_choice("abstain").unwrap(), VoteChoice::Abstain);
        assert!(matches!(
            parse_choice("Approve"),
            Err(AppError::InvalidChoice(_))
        ));
        assert!(matches!(parse_choice(""), Err(AppError::InvalidChoice(_))));
    }

    #[tokio::test]
    async fn test_cast_closed_before_choice_check() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote_model("ALL", now - Duration::seconds(1))]]);

        let result = ballot_box(db, now).cast("v1", &principal(None), "bogus").await;
        assert!(matches!(result, Err(AppError::VoteClosed(_))));
    }

    #[tokio::test]
    async fn test_cast_invalid_choice() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote_model("ALL", now + Duration::minutes(1))]]);

        let result = ballot_box(db, now).cast("v1", &principal(None), "maybe").await;
        assert!(matches!(result, Err(AppError::InvalidChoice(_))));
    }

    #[tokio::test]
    async fn test_cast_wrong_committee_is_not_eligible() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote_model("财政委员会", now + Duration::minutes(1))]]);

        let result = ballot_box(db, now)
            .cast("v1", &principal(Some("交通委员会")), "approve")
            .await;
        assert!(matches!(result, Err(AppError::NotEligible(_))));
    }

    #[tokio::test]
    async fn test_cast_without_attendance() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote_model("ALL", now + Duration::minutes(1))]])
            .append_query_results([Vec::<attendance::Model>::new()]);

        let result = ballot_box(db, now).cast("v1", &principal(None), "approve").await;
        assert!(matches!(result, Err(AppError::NotAttended(_))));
    }

    #[tokio::test]
    async fn test_cast_unknown_vote() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<vote::Model>::new()]);

        let result = ballot_box(db, Utc::now())
            .cast("nope", &principal(None), "approve")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
