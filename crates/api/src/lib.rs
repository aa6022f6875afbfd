//! HTTP API layer for storyvault.
//!
//! - **Endpoints**: REST routes for auth, stories, votes and stats
//! - **Extractors**: Bearer-token authentication
//! - **Middleware**: Token resolution, CORS, request tracing
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
