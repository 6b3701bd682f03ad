//! Route definitions for the queuectl reporting API.
//!
//! All routes are read-only and mounted under `/api`.

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/stats", get(handlers::stats::stats))
        .route("/jobs", get(handlers::jobs::list_jobs))
        .route("/metrics", get(handlers::metrics::metrics));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors::build_cors_layer())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}
