//! Database repositories.

pub mod attendance;
pub mod ballot;
pub mod user;
pub mod vote;

pub use attendance::AttendanceRepository;
pub use ballot::{BallotRepository, ChoiceCounts, is_duplicate_ballot};
pub use user::UserRepository;
pub use vote::VoteRepository;
