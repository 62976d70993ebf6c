use sqlx::PgPool;

use crate::Result;

// Re-export submodules
mod posts;
mod schema;
mod vectors;

// Re-export types
pub use posts::PostContentRow;
pub use vectors::truncate_preview;
pub use vectors::DEFAULT_PREVIEW_MAX_CHARS;

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    preview_max_chars: usize,
}

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self::with_preview_bound(pool, DEFAULT_PREVIEW_MAX_CHARS)
    }

    /// Wrap a pool with an explicit preview bound; the bound sizes the
    /// `content_preview` column and caps previews on every upsert
    #[must_use]
    pub const fn with_preview_bound(pool: PgPool, preview_max_chars: usize) -> Self {
        Self {
            pool,
            preview_max_chars,
        }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;

        tracing::info!(
            "Database pool configured: max_connections={}, min_connections={}",
            config.max_connections(),
            config.min_connections()
        );

        Ok(Self::with_preview_bound(
            pool,
            config.search.preview_max_chars,
        ))
    }

    /// The active preview bound in characters
    #[must_use]
    pub const fn preview_max_chars(&self) -> usize {
        self.preview_max_chars
    }

    /// Get a reference to the database pool for raw queries
    #[must_use]
    pub const fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unreachable")
            .unwrap()
    }

    #[tokio::test]
    async fn test_preview_bound_defaults_and_overrides() {
        let db = Database::new(lazy_pool());
        assert_eq!(db.preview_max_chars(), DEFAULT_PREVIEW_MAX_CHARS);

        let db = Database::with_preview_bound(lazy_pool(), 120);
        assert_eq!(db.preview_max_chars(), 120);
    }
}
