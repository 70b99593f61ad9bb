//! Portfolio site gateway.
//!
//! Rate-limits every request per client, serves stored images through
//! `/api/images`, and serves the read-only profile and layout content with
//! image references rewritten into proxy paths.

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod image;
pub mod metrics;
pub mod rate_limit;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Args;
use crate::handlers::{
    health_handler, image_handler, image_path_required, layout_handler, metrics_handler,
    profile_handler, widgets_handler,
};
use crate::state::AppState;

/// Build the router. Layers run outermost first: trace, CORS, rate limit.
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let limiter = Arc::clone(&state.rate_limiter);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/images", get(image_path_required))
        .route("/api/images/", get(image_path_required))
        .route("/api/images/{*path}", get(image_handler))
        .route("/api/profile", get(profile_handler))
        .route("/api/layout", get(layout_handler))
        .route("/api/widgets", get(widgets_handler))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit::enforce_rate_limit,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn cors_layer(args: &Args) -> CorsLayer {
    let origins: Vec<HeaderValue> = args
        .cors_origins()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}
