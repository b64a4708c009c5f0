//! Route definitions for the BandSync API
//!
//! This module organizes all API routes and applies middleware.

use crate::error::ApiError;
use crate::middleware::{rate_limit, with_security_headers};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, Uri},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod extract;
mod health;


pub use auth::auth_routes;
pub use extract::ApiJson;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/auth", auth::auth_routes())
        .fallback(not_found)
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    if let Some(limiter) = state.rate_limiter.clone() {
        router = router.layer(from_fn_with_state(limiter, rate_limit));
    }

    // Rejections from the limiter get the hardening headers too
    with_security_headers(router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Can't find {} on this server!", uri.path()))
}
