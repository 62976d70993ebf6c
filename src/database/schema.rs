use super::Database;
use crate::Result;

impl Database {
    /// Initialize database schema.
    ///
    /// Idempotent: every statement is `IF NOT EXISTS`, so this is safe to
    /// run on every process start. A failure here leaves semantic search
    /// unavailable but must not take the host process down; callers log
    /// and continue in degraded mode.
    pub async fn init_schema(&self, vector_dimension: usize) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        // Primary post store
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                author_name VARCHAR(255) NOT NULL,
                author_email VARCHAR(255),
                content TEXT NOT NULL,
                likes_count BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Vector index, one row per indexed post; the preview column is
        // sized to the same bound enforced on upsert
        let preview_max_chars = self.preview_max_chars();
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS post_vectors (
                id SERIAL PRIMARY KEY,
                external_id TEXT UNIQUE NOT NULL,
                content_preview VARCHAR({preview_max_chars}) NOT NULL,
                embedding VECTOR({vector_dimension}) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_post_vectors_embedding
            ON post_vectors USING ivfflat (embedding vector_cosine_ops) WITH (lists = 100)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_likes_created ON posts (likes_count DESC, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Database schema initialized (vector dimension: {vector_dimension})");

        Ok(())
    }

    /// Check if database schema is initialized
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        for table_name in ["posts", "post_vectors"] {
            let exists = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

            if !exists {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }

        Ok(true)
    }
}
