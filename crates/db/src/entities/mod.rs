//! Database entities.

pub mod attendance;
pub mod ballot;
pub mod user;
pub mod vote;

pub use attendance::Entity as Attendance;
pub use ballot::Entity as Ballot;
pub use user::Entity as User;
pub use vote::Entity as Vote;
