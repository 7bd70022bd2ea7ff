//! API Routes
//!
//! Configures the Axum router with all regional cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, join_handler, leave_handler,
    list_regions_handler, replication_stats_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /regions/:region/set` - Store a key-value pair
/// - `GET /regions/:region/get/:key` - Retrieve a value by key
/// - `DELETE /regions/:region/del/:key` - Delete a key in one region
/// - `GET /regions/:region/stats` - Region statistics
/// - `GET /regions` - List regions
/// - `POST /regions/:region` - Join a region bootstrapped from hub state
/// - `DELETE /regions/:region` - Unregister and close a region
/// - `GET /replication/stats` - Hub fan-out statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/regions", get(list_regions_handler))
        .route("/regions/:region", post(join_handler).delete(leave_handler))
        .route("/regions/:region/set", put(set_handler))
        .route("/regions/:region/get/:key", get(get_handler))
        .route("/regions/:region/del/:key", delete(delete_handler))
        .route("/regions/:region/stats", get(stats_handler))
        .route("/replication/stats", get(replication_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
