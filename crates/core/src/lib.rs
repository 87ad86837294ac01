//! Vote lifecycle and tally engine for rollcall.
//!
//! Every service reads time from a shared [`Clock`] and decides the
//! open/closed state of a vote with [`is_open`]. [`Engine`] wires the
//! services onto one database handle.

pub mod clock;
pub mod engine;
pub mod principal;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use principal::{Principal, TargetGroup};
pub use services::*;
