//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use storyvault_core::{StatsService, StoryService, UserService, VoteService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub story_service: StoryService,
    pub vote_service: VoteService,
    pub stats_service: StatsService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stashes the user in request
/// extensions. Requests with no token or a bad one pass through anonymous;
/// individual handlers decide whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token did not resolve to a user");
            }
        }
    }

    next.run(req).await
}
