//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create the API router.
///
/// One coherent search contract: `/ai/search` is lenient and always
/// answers 200 with either a RAG result or a tagged keyword fallback.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Search
        .route("/ai/search", post(handlers::smart_search))
        // Operator utilities
        .route("/ai/reindex", post(handlers::reindex_all))
        .with_state(state)
}
