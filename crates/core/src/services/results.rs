//! Results aggregation.

use rollcall_common::{AppError, AppResult};
use rollcall_db::entities::{ballot::VoteChoice, vote};
use rollcall_db::repositories::{AttendanceRepository, BallotRepository, ChoiceCounts, VoteRepository};
use serde::Serialize;

use crate::services::eligibility::EligibilityResolver;

/// Tally of a vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteSummary {
    pub vote: vote::Model,
    pub total_eligible: u64,
    pub total_present: u64,
    /// Percentage rounded to two decimals.
    pub attendance_rate: f64,
    pub counts: ChoiceCounts,
    pub is_anonymous: bool,
}

/// One disclosed ballot with its voter's public identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteRecord {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub party: Option<String>,
    pub committee: Option<String>,
    pub vote_choice: VoteChoice,
}

/// `present / eligible` as a percentage rounded to two decimals, 0 without eligible voters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn attendance_rate(present: u64, eligible: u64) -> f64 {
    if eligible == 0 {
        return 0.0;
    }
    let rate = present as f64 / eligible as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Computes tallies and discloses per-voter records.
#[derive(Clone)]
pub struct ResultsAggregator {
    vote_repo: VoteRepository,
    attendance_repo: AttendanceRepository,
    ballot_repo: BallotRepository,
    eligibility: EligibilityResolver,
}

impl ResultsAggregator {
    /// Create a new results aggregator.
    #[must_use]
    pub const fn new(
        vote_repo: VoteRepository,
        attendance_repo: AttendanceRepository,
        ballot_repo: BallotRepository,
        eligibility: EligibilityResolver,
    ) -> Self {
        Self {
            vote_repo,
            attendance_repo,
            ballot_repo,
            eligibility,
        }
    }

    /// Attendance and choice tallies for a vote.
    pub async fn compute_summary(&self, vote_id: &str) -> AppResult<VoteSummary> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;

        let total_eligible = self.eligibility.eligible_count(&vote).await?;
        let total_present = self.attendance_repo.count_present(&vote.id).await?;
        let counts = self.ballot_repo.count_by_choice(&vote.id).await?;

        Ok(VoteSummary {
            total_eligible,
            total_present,
            attendance_rate: attendance_rate(total_present, total_eligible),
            counts,
            is_anonymous: vote.is_anonymous,
            vote,
        })
    }

    /// Every ballot of a non-anonymous vote with its voter.
    pub async fn list_records(&self, vote_id: &str) -> AppResult<Vec<VoteRecord>> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        if vote.is_anonymous {
            return Err(AppError::Forbidden(
                "Records of an anonymous vote are not disclosed".to_string(),
            ));
        }

        let rows = self.ballot_repo.find_by_vote_with_voters(&vote.id).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(ballot, voter)| {
                voter.map(|user| VoteRecord {
                    id: ballot.id,
                    username: user.username,
                    display_name: user.display_name,
                    party: user.party,
                    committee: user.committee,
                    vote_choice: ballot.vote_choice,
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rollcall_db::repositories::UserRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn vote_model(is_anonymous: bool) -> vote::Model {
        let now = Utc::now();
        vote::Model {
            id: "v1".to_string(),
            title: "Motion".to_string(),
            description: String::new(),
            start_time: now.into(),
            end_time: now.into(),
            is_anonymous,
            target_group: "ALL".to_string(),
            created_at: now.into(),
        }
    }

    fn aggregator(db: MockDatabase) -> ResultsAggregator {
        let conn = Arc::new(db.into_connection());
        ResultsAggregator::new(
            VoteRepository::new(Arc::clone(&conn)),
            AttendanceRepository::new(Arc::clone(&conn)),
            BallotRepository::new(Arc::clone(&conn)),
            EligibilityResolver::new(UserRepository::new(conn)),
        )
    }

    fn count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    #[test]
    fn test_attendance_rate_bounds() {
        assert!(attendance_rate(0, 0).abs() < f64::EPSILON);
        assert!(attendance_rate(5, 0).abs() < f64::EPSILON);
        assert!((attendance_rate(4, 4) - 100.0).abs() < f64::EPSILON);
        assert!((attendance_rate(2, 3) - 66.67).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_compute_summary() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote_model(false)]])
            .append_query_results([[count(4)]])
            .append_query_results([[count(2)]])
            .append_query_results([[
                maplit::btreemap! {
                    "vote_choice" => sea_orm::Value::String(Some(Box::new("approve".to_string()))),
                    "votes_count" => sea_orm::Value::BigInt(Some(1)),
                },
                maplit::btreemap! {
                    "vote_choice" => sea_orm::Value::String(Some(Box::new("abstain".to_string()))),
                    "votes_count" => sea_orm::Value::BigInt(Some(1)),
                },
            ]]);

        let summary = aggregator(db).compute_summary("v1").await.unwrap();
        assert_eq!(summary.total_eligible, 4);
        assert_eq!(summary.total_present, 2);
        assert!((summary.attendance_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.counts.approve, 1);
        assert_eq!(summary.counts.abstain, 1);
        assert!(!summary.is_anonymous);
    }

    #[tokio::test]
    async fn test_records_of_anonymous_vote_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote_model(true)]]);

        let result = aggregator(db).list_records("v1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
