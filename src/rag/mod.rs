//! RAG (Retrieval-Augmented Generation) search module
//!
//! End-to-end semantic search over posts:
//! - Query sanitization and embedding
//! - Vector similarity retrieval (pgvector, cosine)
//! - Candidate hydration from the primary post store
//! - LLM relevance gating of the retrieved batch
//!
//! The write path lives in [`Indexer`] (best-effort, never surfaces
//! failures to post mutations); the request-facing entry point is
//! [`SearchGateway`], which adds rate limiting and the keyword fallback
//! used when no LLM is configured.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use postrag::config::AppConfig;
//! use postrag::database::Database;
//! use postrag::embeddings::EmbeddingService;
//! use postrag::llm::LlmClient;
//! use postrag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let database = Arc::new(Database::from_config(&config).await?);
//!     let embedder = Arc::new(EmbeddingService::new(&config));
//!     let llm = Arc::new(LlmClient::new(&config)?);
//!
//!     let service = RagService::new(database, embedder, llm, &config);
//!     let result = service.rag_search("posts about rust async").await?;
//!     println!("{} sources, noResults={}", result.sources.len(), result.no_results);
//!
//!     Ok(())
//! }
//! ```

pub mod gateway;
pub mod indexer;
pub mod pipeline;
pub mod prompts;

pub use gateway::extract_fallback_terms;
pub use gateway::SearchGateway;
pub use gateway::SearchOutcome;
pub use indexer::Indexer;
pub use pipeline::sanitize_query;
pub use pipeline::RagResult;
pub use pipeline::RagService;
