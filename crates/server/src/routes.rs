//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/upload/", post(handlers::upload_database))
        .route("/api/upload", post(handlers::upload_database))
        .route("/api/upload/sql", post(handlers::upload_sql))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    let mut router = Router::new().merge(api_routes);

    // Conditionally add metrics endpoint based on config.
    // See crate::metrics module documentation for deployment notes.
    if state.config.server.metrics_enabled {
        let metrics_routes = Router::new().route("/metrics", get(metrics_handler));
        router = router.merge(metrics_routes);
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
