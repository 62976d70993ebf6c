/// API request handlers
use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;

use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::embeddings::EmbeddingService;
use crate::llm::LlmClient;
use crate::rag::Indexer;
use crate::rag::SearchGateway;
use crate::rate_limit::InMemoryRateLimiter;

// Re-export sub-modules
pub mod admin;
pub mod search;

// Re-export handlers
pub use admin::*;
pub use search::*;

/// Production gateway wired with the real embedding, LLM, and limiter types
pub type AppGateway = SearchGateway<EmbeddingService, LlmClient, InMemoryRateLimiter>;

/// Production indexer
pub type AppIndexer = Indexer<EmbeddingService>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AppGateway>,
    pub indexer: Arc<AppIndexer>,
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build a `{error}` JSON response with the given status
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Pull the caller identity from the `x-user-id` header.
///
/// The authentication protocol itself lives with the auth collaborator;
/// this layer only requires that an identity is present.
pub(crate) fn require_user_id(headers: &HeaderMap) -> std::result::Result<String, Response> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "Unauthorized"))
}
