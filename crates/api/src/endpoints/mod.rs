//! API endpoints.

mod auth;
mod stats;
mod stories;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/stories", stories::router())
        .nest("/stats", stats::router())
}
