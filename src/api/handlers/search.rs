/// Search API handlers
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
use crate::api::types::FallbackResponse;
use crate::api::types::SearchRequest;
use crate::errors::PostRagError;
use crate::rag::SearchOutcome;

/// POST /ai/search
///
/// Lenient contract: always 200 on success, with either a full RAG result
/// or a `fallback: true` keyword result when no LLM is configured.
/// Internal failures are mapped to a generic 500; only validation and
/// rate-limit rejections carry specific messages.
pub async fn smart_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    info!("POST /ai/search by {}", user_id);

    match state.gateway.smart_search(&user_id, &req.query).await {
        Ok(SearchOutcome::Rag(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(SearchOutcome::Fallback(posts)) => (
            StatusCode::OK,
            Json(FallbackResponse {
                posts,
                fallback: true,
            }),
        )
            .into_response(),
        Err(PostRagError::Validation(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(PostRagError::RateLimitExceeded) => {
            error_response(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")
        }
        Err(e) => {
            // Never leak internal failure details to the caller
            error!("Search failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Search failed")
        }
    }
}
