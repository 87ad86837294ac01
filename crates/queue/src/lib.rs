//! Background jobs for rollcall.
//!
//! - **Scheduler**: periodic tasks stopped through a shutdown channel
//! - **Executor**: the engine-backed implementation of those tasks

pub mod executor;
pub mod scheduler;

pub use executor::EngineJobExecutor;
pub use scheduler::{JobExecutor, SchedulerConfig, run_scheduler};
