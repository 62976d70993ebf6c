//! Lazily initialized embedding service

use std::future::Future;

use tokio::sync::OnceCell;
use tracing::info;

use super::EmbeddingClient;
use super::EmbeddingConfig;
use super::EMBED_INPUT_MAX_CHARS;
use crate::errors::PostRagError;
use crate::errors::Result;

/// Seam for embedding generation, allowing deterministic embedders in tests
pub trait Embedder: Send + Sync {
    /// Normalize and embed a text into a fixed-dimension vector
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Expected output dimension
    fn dimension(&self) -> usize;
}

/// Normalize text before embedding: collapse whitespace, trim, and
/// truncate to the model input bound
#[must_use]
pub fn normalize_embed_input(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(EMBED_INPUT_MAX_CHARS).collect()
}

/// Process-wide embedding service.
///
/// The underlying client (and the provider-side model) is initialized at
/// most once; all concurrent `embed` calls during the in-flight
/// initialization await the same future. Once ready it stays loaded for
/// the process lifetime.
pub struct EmbeddingService {
    config: EmbeddingConfig,
    client: OnceCell<EmbeddingClient>,
}

impl EmbeddingService {
    /// Create a new embedding service. No network activity happens until
    /// the first `embed` or `preload` call.
    #[must_use]
    pub fn new(config: &crate::config::AppConfig) -> Self {
        Self {
            config: EmbeddingConfig::from_app_config(config),
            client: OnceCell::new(),
        }
    }

    /// Create from custom config
    #[must_use]
    pub fn from_config(config: EmbeddingConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Trigger model initialization eagerly. Safe to call concurrently
    /// with `embed`; both share the same one-time initialization.
    pub async fn preload(&self) -> Result<()> {
        self.client().await.map(|_| ())
    }

    async fn client(&self) -> Result<&EmbeddingClient> {
        self.client
            .get_or_try_init(|| async {
                info!(
                    "Loading embedding model: {} ({} dimensions)",
                    self.config.model, self.config.dimension
                );

                let client = EmbeddingClient::new(
                    self.config.provider,
                    self.config.model.clone(),
                    self.config.endpoint.clone(),
                    self.config.api_key.clone(),
                )?;

                // Warmup request so the provider pulls/loads the model now
                // rather than on the first user-facing call
                client.generate("warmup").await?;

                info!("Embedding model loaded successfully");
                Ok(client)
            })
            .await
    }

    async fn embed_normalized(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = normalize_embed_input(text);
        if normalized.is_empty() {
            return Err(PostRagError::EmptyInput);
        }

        let client = self.client().await?;
        let embedding = client.generate(&normalized).await?;

        // A wrong output length means the configured dimension does not
        // match the model; retrying cannot fix that
        if embedding.len() != self.config.dimension {
            return Err(PostRagError::DimensionMismatch {
                expected: self.config.dimension,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }
}

impl Embedder for EmbeddingService {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send {
        self.embed_normalized(text)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_embed_input("  hello \n\t  world  "),
            "hello world"
        );
    }

    #[test]
    fn test_normalize_truncates_to_input_bound() {
        let long = "word ".repeat(200);
        let normalized = normalize_embed_input(&long);
        assert_eq!(normalized.chars().count(), EMBED_INPUT_MAX_CHARS);
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_embed_input("   \n\t "), "");
    }
}
