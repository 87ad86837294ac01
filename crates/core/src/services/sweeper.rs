//! Auto-abstain sweeper.
//!
//! Once a vote closes, every attendee still without a ballot is recorded as
//! abstaining, so tallies account for everyone who showed up.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::entities::ballot::{self, VoteChoice};
use rollcall_db::repositories::{AttendanceRepository, BallotRepository};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use tracing::{info, warn};

use crate::clock::Clock;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Attendance rows found silent after close.
    pub scanned: usize,
    /// Abstentions written.
    pub abstained: usize,
    /// Rows that already had a ballot and were only flagged.
    pub flagged: usize,
    /// Rows that failed and will be retried next sweep.
    pub failed: usize,
}

/// Converts silent attendees of closed votes into abstentions.
#[derive(Clone)]
pub struct AutoAbstainSweeper {
    db: Arc<DatabaseConnection>,
    attendance_repo: AttendanceRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl AutoAbstainSweeper {
    /// Create a new sweeper.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        Self {
            attendance_repo: AttendanceRepository::new(Arc::clone(&db)),
            db,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Run one sweep over every closed vote.
    ///
    /// Per-row failures are logged and counted, never propagated; only a
    /// failure to list the pending rows fails the sweep.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let now = self.clock.now();
        let pending = self.attendance_repo.find_silent_after_close(now).await?;

        let mut report = SweepReport {
            scanned: pending.len(),
            ..SweepReport::default()
        };

        for row in &pending {
            match self.sweep_pair(&row.vote_id, &row.user_id, now).await {
                Ok(true) => report.abstained += 1,
                Ok(false) => report.flagged += 1,
                Err(e) => {
                    warn!(
                        vote_id = %row.vote_id,
                        user_id = %row.user_id,
                        error = %e,
                        "Failed to record abstention"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.scanned > 0 {
            info!(
                scanned = report.scanned,
                abstained = report.abstained,
                flagged = report.flagged,
                failed = report.failed,
                "Auto-abstain sweep finished"
            );
        }
        Ok(report)
    }

    /// Abstain one pair unless it already has a ballot, then flag it.
    ///
    /// Returns whether an abstention was written.
    async fn sweep_pair(&self, vote_id: &str, user_id: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = ballot::ActiveModel {
            id: Set(self.id_gen.generate()),
            vote_id: Set(vote_id.to_string()),
            user_id: Set(user_id.to_string()),
            vote_choice: Set(VoteChoice::Abstain),
            vote_time: Set(now.fixed_offset()),
        };
        let inserted = BallotRepository::insert_if_absent_in(&txn, model).await?;
        AttendanceRepository::mark_voted_in(&txn, vote_id, user_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted)
    }
}
