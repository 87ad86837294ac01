//! HTTP API layer for rollcall.
//!
//! - **Endpoints**: vote lifecycle, attendance, casting and results
//! - **Extractors**: authenticated and admin principals
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8.

pub mod auth;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use auth::{Claims, TokenVerifier};
pub use endpoints::{health, router};
pub use middleware::{AppState, auth_middleware};
