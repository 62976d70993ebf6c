//! Request-facing search gateway: rate limiting, validation, and the
//! keyword fallback used when the RAG pipeline is unavailable

use std::sync::Arc;

use tracing::debug;

use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::Embedder;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::llm::RelevanceClassifier;
use crate::models::Post;
use crate::rag::pipeline::RagResult;
use crate::rag::RagService;
use crate::rate_limit::RateLimiter;

/// What a smart search produced: the full RAG envelope, or plain posts
/// from the keyword fallback
#[derive(Debug)]
pub enum SearchOutcome {
    Rag(RagResult),
    Fallback(Vec<Post>),
}

/// Split a query into fallback search terms: whitespace-separated tokens
/// longer than 2 characters
#[must_use]
pub fn extract_fallback_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(String::from)
        .collect()
}

pub struct SearchGateway<E, L, R> {
    rag: RagService<E, L>,
    database: Arc<Database>,
    limiter: R,
    fallback_limit: i64,
}

impl<E, L, R> SearchGateway<E, L, R>
where
    E: Embedder,
    L: RelevanceClassifier,
    R: RateLimiter,
{
    pub fn new(
        rag: RagService<E, L>,
        database: Arc<Database>,
        limiter: R,
        config: &AppConfig,
    ) -> Self {
        Self {
            rag,
            database,
            limiter,
            fallback_limit: config.search.fallback_limit,
        }
    }

    /// Rate-limited search that prefers the RAG pipeline and degrades to
    /// keyword search when no LLM is configured.
    ///
    /// The fallback path never touches the vector store or the LLM.
    ///
    /// # Errors
    /// - `RateLimitExceeded` when the caller is over their window budget
    /// - `Validation` for empty/whitespace-only queries
    /// - Any RAG pipeline failure (callers map these to a generic search
    ///   failure at the HTTP boundary)
    pub async fn smart_search(&self, user_id: &str, raw_query: &str) -> Result<SearchOutcome> {
        if !self.limiter.check(user_id) {
            return Err(PostRagError::RateLimitExceeded);
        }

        if raw_query.trim().is_empty() {
            return Err(PostRagError::Validation("Query is required".to_string()));
        }

        if self.rag.is_available() {
            let result = self.rag.rag_search(raw_query).await?;
            return Ok(SearchOutcome::Rag(result));
        }

        debug!("LLM unavailable, using keyword fallback");

        let terms = extract_fallback_terms(raw_query);
        let posts = self
            .database
            .keyword_search_posts(&terms, self.fallback_limit)
            .await?;

        Ok(SearchOutcome::Fallback(posts))
    }

    /// The underlying RAG service
    pub fn rag(&self) -> &RagService<E, L> {
        &self.rag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_terms_drop_short_tokens() {
        assert_eq!(
            extract_fallback_terms("alpha be beta c"),
            vec!["alpha".to_string(), "beta".to_string()]
        );
    }

    #[test]
    fn test_fallback_terms_empty_query() {
        assert!(extract_fallback_terms("").is_empty());
        assert!(extract_fallback_terms("a b c").is_empty());
    }

    #[test]
    fn test_fallback_terms_count_chars_not_bytes() {
        // "héé" is 3 chars but 5 bytes; must be kept by the >2 chars rule
        assert_eq!(extract_fallback_terms("héé"), vec!["héé".to_string()]);
    }
}
