//! LLM client module
//!
//! The LLM is used for exactly one thing here: judging whether a batch of
//! retrieved posts is relevant to a query. The client is a thin stateless
//! wrapper over an OpenAI-compatible chat-completion endpoint with a hard
//! call timeout; retry policy, if any, belongs to callers (none is
//! implemented).

pub mod client;

pub use client::parse_relevance_verdict;
pub use client::LlmClient;
pub use client::RelevanceClassifier;
