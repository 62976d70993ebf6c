//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::Post;

/// Search request body
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Error payload; the message is intentionally generic for internal
/// failures and specific only for validation and rate-limit rejections
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Keyword-fallback response, tagged so clients can tell it apart from a
/// full RAG result
#[derive(Debug, Serialize)]
pub struct FallbackResponse {
    pub posts: Vec<Post>,
    pub fallback: bool,
}

/// Reindex report response
#[derive(Debug, Serialize)]
pub struct ReindexResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
