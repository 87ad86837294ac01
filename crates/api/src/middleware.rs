//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use rollcall_core::{Engine, Principal};
use tracing::{debug, warn};

use crate::auth::TokenVerifier;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Engine services.
    pub engine: Engine,
    /// Bearer token verifier.
    pub tokens: Arc<TokenVerifier>,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(engine: Engine, tokens: TokenVerifier) -> Self {
        Self {
            engine,
            tokens: Arc::new(tokens),
        }
    }
}

/// Authentication middleware.
///
/// Resolves a valid bearer token to the current directory entry of its
/// subject and stores the [`Principal`] in the request extensions. Requests
/// without one pass through; extractors decide whether that is an error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user_id) = state.tokens.verify(token)
    {
        match state.engine.users.find_by_id(&user_id).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(Principal::from(user));
            }
            Ok(None) => debug!(user_id, "Token subject not in user directory"),
            Err(e) => warn!(user_id, error = %e, "Failed to load principal"),
        }
    }

    next.run(req).await
}
