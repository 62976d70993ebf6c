/// Operator utility handlers
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use tracing::info;

use super::error_response;
use super::require_user_id;
use super::AppState;
use crate::api::types::ReindexResponse;

/// POST /ai/reindex
///
/// Re-embeds every post; per-post failures are skipped, not fatal.
pub async fn reindex_all(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    info!("POST /ai/reindex by {}", user_id);

    match state.indexer.reindex_all().await {
        Ok(report) => (
            StatusCode::OK,
            Json(ReindexResponse {
                message: report.message(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Reindex failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Reindex failed")
        }
    }
}
