//! Embeddings generation module
//!
//! Provides text embedding generation backed by HTTP providers:
//! - OpenAI (text-embedding-3-small, etc.)
//! - Ollama (local models such as all-minilm)
//!
//! The provider-side model is loaded lazily: the first embedding call (or
//! an explicit [`EmbeddingService::preload`]) triggers a warmup request,
//! and concurrent callers share the single in-flight initialization.
//!
//! # Examples
//!
//! ```rust,no_run
//! use postrag::embeddings::Embedder;
//! use postrag::embeddings::EmbeddingService;
//! use postrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config);
//!
//!     let embedding = service.embed("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod provider;

pub use client::EmbeddingClient;
pub use client::EmbeddingProviderKind;
pub use provider::normalize_embed_input;
pub use provider::Embedder;
pub use provider::EmbeddingService;

/// Maximum characters fed to the embedding model per input
pub const EMBED_INPUT_MAX_CHARS: usize = 512;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        // Keyed providers are OpenAI-shaped; keyless endpoints are assumed
        // to be Ollama-compatible local services
        let provider = if config.embeddings.endpoint.contains("api.openai.com")
            || config.embeddings.api_key.is_some()
        {
            EmbeddingProviderKind::OpenAI
        } else {
            EmbeddingProviderKind::Ollama
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embedding_endpoint().to_string(),
            api_key: config.embeddings.api_key.clone(),
        }
    }
}
