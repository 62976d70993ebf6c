use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Text is empty after normalization")]
    EmptyInput,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("LLM is not configured (missing API key)")]
    LlmUnavailable,

    #[error("LLM call exceeded timeout of {0}ms")]
    LlmTimeout(u64),

    #[error("LLM provider error ({status}): {body}")]
    LlmProvider { status: u16, body: String },

    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, PostRagError>;
