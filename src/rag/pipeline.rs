//! Query-time RAG pipeline: sanitize -> embed -> retrieve -> hydrate -> gate

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::SearchConfig;
use crate::database::Database;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::llm::parse_relevance_verdict;
use crate::llm::RelevanceClassifier;
use crate::models::RankedPost;
use crate::models::SimilarityCandidate;
use crate::rag::prompts;

const NO_MATCH_ANSWER: &str = "I couldn't find relevant posts to answer this question.";
const REJECTED_ANSWER: &str =
    "The search found some posts, but they don't seem relevant to your question. Try rephrasing your query.";

/// Response envelope for a RAG search.
///
/// Exactly one of `posts` (relevant case) or `no_results = true` with an
/// explanatory `answer` (no-match or rejected case) is populated per call.
#[derive(Debug, Clone, Serialize)]
pub struct RagResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub sources: Vec<SimilarityCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<RankedPost>>,
    #[serde(rename = "processingTime")]
    pub processing_time_ms: u64,
    #[serde(rename = "noResults")]
    pub no_results: bool,
}

/// Sanitize a raw user query: strip `< > " ' \`, collapse whitespace,
/// trim, and truncate to `max_chars`
#[must_use]
pub fn sanitize_query(raw: &str, max_chars: usize) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '\\'))
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

/// Query-time RAG orchestrator
pub struct RagService<E, L> {
    database: Arc<Database>,
    embedder: Arc<E>,
    classifier: Arc<L>,
    search: SearchConfig,
}

impl<E, L> RagService<E, L>
where
    E: Embedder,
    L: RelevanceClassifier,
{
    pub fn new(
        database: Arc<Database>,
        embedder: Arc<E>,
        classifier: Arc<L>,
        config: &AppConfig,
    ) -> Self {
        Self {
            database,
            embedder,
            classifier,
            search: config.search.clone(),
        }
    }

    /// Whether the full RAG path can run (the LLM gate is configured)
    pub fn is_available(&self) -> bool {
        self.classifier.is_available()
    }

    /// Perform a complete RAG search.
    ///
    /// # Errors
    /// - Embedding failures (provider errors, dimension mismatch)
    /// - Vector store or post store query failures
    /// - LLM failures (unavailable, timeout, provider error)
    pub async fn rag_search(&self, raw_query: &str) -> Result<RagResult> {
        let start = Instant::now();
        let query = sanitize_query(raw_query, self.search.query_max_chars);

        if query.is_empty() {
            return Ok(RagResult {
                answer: None,
                sources: Vec::new(),
                posts: None,
                processing_time_ms: elapsed_ms(start),
                no_results: true,
            });
        }

        info!("Processing RAG search: {}", query);

        let query_embedding = self.embedder.embed(&query).await?;

        let candidates = self
            .database
            .search_similar_posts(
                query_embedding,
                self.search.top_k,
                self.search.similarity_threshold,
            )
            .await?;

        debug!("Retrieved {} candidates", candidates.len());

        if candidates.is_empty() {
            return Ok(RagResult {
                answer: Some(NO_MATCH_ANSWER.to_string()),
                sources: Vec::new(),
                posts: None,
                processing_time_ms: elapsed_ms(start),
                no_results: true,
            });
        }

        // Hydrate candidates from the primary store, silently dropping
        // dangling index entries for posts deleted mid-flight
        let ids: Vec<String> = candidates.iter().map(|c| c.external_id.clone()).collect();
        let post_map = self.database.get_posts_by_ids(&ids).await?;

        let sources: Vec<SimilarityCandidate> = candidates
            .into_iter()
            .filter(|c| post_map.contains_key(&c.external_id))
            .collect();

        if sources.is_empty() {
            return Ok(RagResult {
                answer: Some(NO_MATCH_ANSWER.to_string()),
                sources: Vec::new(),
                posts: None,
                processing_time_ms: elapsed_ms(start),
                no_results: true,
            });
        }

        let entries: Vec<(String, String)> = sources
            .iter()
            .map(|c| {
                let author = post_map
                    .get(&c.external_id)
                    .map_or_else(|| "Unknown".to_string(), |p| p.author_name.clone());
                (author, c.content_preview.clone())
            })
            .collect();

        let system = prompts::relevance_system_prompt();
        let user = prompts::relevance_user_prompt(&query, &entries);

        let evaluation = self.classifier.classify_relevance(&system, &user).await?;
        debug!("Relevance evaluation: {}", evaluation.trim());

        if parse_relevance_verdict(&evaluation) {
            let posts: Vec<RankedPost> = sources
                .iter()
                .filter_map(|c| {
                    post_map.get(&c.external_id).map(|p| RankedPost {
                        post: p.clone(),
                        relevance_score: c.score,
                    })
                })
                .collect();

            Ok(RagResult {
                answer: None,
                sources,
                posts: Some(posts),
                processing_time_ms: elapsed_ms(start),
                no_results: false,
            })
        } else {
            Ok(RagResult {
                answer: Some(REJECTED_ANSWER.to_string()),
                sources: Vec::new(),
                posts: None,
                processing_time_ms: elapsed_ms(start),
                no_results: true,
            })
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
