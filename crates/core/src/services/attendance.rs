//! Attendance ledger.

use std::sync::Arc;

use rollcall_common::{AppError, AppResult};
use rollcall_db::repositories::{AttendanceRepository, VoteRepository};
use tracing::debug;

use crate::clock::Clock;
use crate::principal::Principal;
use crate::services::vote::is_open;

/// Records principals' presence for votes.
#[derive(Clone)]
pub struct AttendanceLedger {
    vote_repo: VoteRepository,
    attendance_repo: AttendanceRepository,
    clock: Arc<dyn Clock>,
}

impl AttendanceLedger {
    /// Create a new attendance ledger.
    #[must_use]
    pub fn new(
        vote_repo: VoteRepository,
        attendance_repo: AttendanceRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vote_repo,
            attendance_repo,
            clock,
        }
    }

    /// Register `principal` as present for the vote.
    ///
    /// Registering again only refreshes the attendance time. Eligibility is
    /// not checked here; it is enforced when the ballot is cast.
    pub async fn register(&self, vote_id: &str, principal: &Principal) -> AppResult<()> {
        let vote = self.vote_repo.get_by_id(vote_id).await?;
        let now = self.clock.now();

        if !is_open(&vote, now) {
            return Err(AppError::VoteClosed(vote.id));
        }

        self.attendance_repo
            .upsert(&vote.id, &principal.id, now)
            .await?;
        debug!(vote_id, user_id = %principal.id, "Attendance registered");
        Ok(())
    }
}
