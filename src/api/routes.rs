//! API Routes
//!
//! Configures the Axum router with all edge cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, invalidate_pattern_handler,
    invalidate_tag_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a value in one or more regions
/// - `GET /get/:region/:key` - Read a value from a region
/// - `DELETE /del/:key` - Delete a key (`?regions=a,b` to narrow)
/// - `POST /invalidate/tag/:tag` - Remove every entry carrying a tag
/// - `POST /invalidate/pattern` - Remove every entry matching a glob
/// - `GET /stats` - Per-region statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:region/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/invalidate/tag/:tag", post(invalidate_tag_handler))
        .route("/invalidate/pattern", post(invalidate_pattern_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
