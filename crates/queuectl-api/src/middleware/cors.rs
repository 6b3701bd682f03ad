//! CORS layer configuration.

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Read-only CORS policy: any origin, `GET` only.
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600))
}
