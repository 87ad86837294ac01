//! Service wiring.

use std::sync::Arc;

use rollcall_db::repositories::{
    AttendanceRepository, BallotRepository, UserRepository, VoteRepository,
};
use sea_orm::DatabaseConnection;

use crate::clock::Clock;
use crate::services::{
    AttendanceLedger, AutoAbstainSweeper, BallotBox, EligibilityResolver, ResultsAggregator,
    VoteRegistry,
};

/// All engine services sharing one connection pool and clock.
#[derive(Clone)]
#[allow(missing_docs)]
pub struct Engine {
    pub votes: VoteRegistry,
    pub eligibility: EligibilityResolver,
    pub attendance: AttendanceLedger,
    pub ballots: BallotBox,
    pub sweeper: AutoAbstainSweeper,
    pub results: ResultsAggregator,
    pub users: UserRepository,
    /// Per-caller lookups for annotating vote listings.
    pub attendance_repo: AttendanceRepository,
    pub ballot_repo: BallotRepository,
}

impl Engine {
    /// Build every service on `db`.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        let vote_repo = VoteRepository::new(Arc::clone(&db));
        let attendance_repo = AttendanceRepository::new(Arc::clone(&db));
        let ballot_repo = BallotRepository::new(Arc::clone(&db));
        let users = UserRepository::new(Arc::clone(&db));
        let eligibility = EligibilityResolver::new(users.clone());

        Self {
            votes: VoteRegistry::new(vote_repo.clone(), Arc::clone(&clock)),
            attendance: AttendanceLedger::new(
                vote_repo.clone(),
                attendance_repo.clone(),
                Arc::clone(&clock),
            ),
            ballots: BallotBox::new(Arc::clone(&db), Arc::clone(&clock)),
            sweeper: AutoAbstainSweeper::new(db, clock),
            results: ResultsAggregator::new(
                vote_repo,
                attendance_repo.clone(),
                ballot_repo.clone(),
                eligibility.clone(),
            ),
            eligibility,
            users,
            attendance_repo,
            ballot_repo,
        }
    }
}
