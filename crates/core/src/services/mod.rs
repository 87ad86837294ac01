//! Engine services.

#![allow(missing_docs)]

pub mod attendance;
pub mod ballot;
pub mod eligibility;
pub mod results;
pub mod sweeper;
pub mod vote;

pub use attendance::AttendanceLedger;
pub use ballot::{BallotBox, parse_choice};
pub use eligibility::{EligibilityResolver, is_eligible};
pub use results::{ResultsAggregator, VoteRecord, VoteSummary, attendance_rate};
pub use sweeper::{AutoAbstainSweeper, SweepReport};
pub use vote::{CreateVoteInput, VoteRegistry, is_open};
