//! API endpoints.

mod votes;

use axum::{Router, routing::get};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .nest("/votes", votes::router())
}

/// Liveness text.
pub async fn health() -> &'static str {
    "Voting System API is running"
}
