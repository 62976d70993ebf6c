//! Vector store operations over the `post_vectors` table

use pgvector::Vector;

use super::Database;
use crate::models::PostVectorRecord;
use crate::models::SimilarityCandidate;
use crate::Result;

/// Preview bound used when none is configured, matches the original
/// `content_preview VARCHAR(500)` column
pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 500;

/// Truncate post content to a preview bound on a char boundary
#[must_use]
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}

impl Database {
    /// Insert or replace the vector record for a post.
    ///
    /// Concurrent upserts for different posts rely on PostgreSQL row-level
    /// locking; no application-level locking is added.
    pub async fn upsert_post_vector(
        &self,
        external_id: &str,
        content_preview: &str,
        embedding: Vec<f32>,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO post_vectors (external_id, content_preview, embedding, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (external_id) DO UPDATE SET
                content_preview = EXCLUDED.content_preview,
                embedding = EXCLUDED.embedding,
                updated_at = NOW()
            ",
        )
        .bind(external_id)
        .bind(truncate_preview(content_preview, self.preview_max_chars()))
        .bind(Vector::from(embedding))
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete the vector record for a post, if any
    pub async fn delete_post_vector(&self, external_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM post_vectors WHERE external_id = $1")
            .bind(external_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Top-K cosine similarity search over indexed posts.
    ///
    /// Scores are normalized as `1 - cosine_distance`, candidates below
    /// `min_score` are filtered out, and an empty result is a normal
    /// no-match outcome rather than an error.
    pub async fn search_similar_posts(
        &self,
        query_embedding: Vec<f32>,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SimilarityCandidate>> {
        #[derive(sqlx::FromRow)]
        struct RawResult {
            external_id: String,
            content_preview: String,
            score: f64, // PostgreSQL returns FLOAT8 from the distance operator
        }

        let raw_results = sqlx::query_as::<_, RawResult>(
            r"
            SELECT
                external_id,
                content_preview,
                1 - (embedding <=> $1) AS score
            FROM post_vectors
            WHERE 1 - (embedding <=> $1) >= $2
            ORDER BY embedding <=> $1
            LIMIT $3
            ",
        )
        .bind(Vector::from(query_embedding))
        .bind(f64::from(min_score))
        .bind(i64::try_from(top_k).unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await?;

        let candidates = raw_results
            .into_iter()
            .map(|r| SimilarityCandidate {
                external_id: r.external_id,
                content_preview: r.content_preview,
                score: r.score as f32,
            })
            .collect();

        Ok(candidates)
    }

    /// Fetch the stored vector record for a post, if indexed
    pub async fn get_post_vector(&self, external_id: &str) -> Result<Option<PostVectorRecord>> {
        let record = sqlx::query_as::<_, PostVectorRecord>(
            r"
            SELECT external_id, content_preview, created_at, updated_at
            FROM post_vectors
            WHERE external_id = $1
            ",
        )
        .bind(external_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(record)
    }

    /// Count indexed posts
    pub async fn count_post_vectors(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_vectors")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_preview_bounds_length() {
        let long = "x".repeat(1200);
        assert_eq!(
            truncate_preview(&long, DEFAULT_PREVIEW_MAX_CHARS)
                .chars()
                .count(),
            DEFAULT_PREVIEW_MAX_CHARS
        );

        let short = "hello";
        assert_eq!(truncate_preview(short, DEFAULT_PREVIEW_MAX_CHARS), "hello");
    }

    #[test]
    fn test_truncate_preview_honors_custom_bound() {
        let text = "abcdefghij";
        assert_eq!(truncate_preview(text, 4), "abcd");
        assert_eq!(truncate_preview(text, 100), text);
    }

    #[test]
    fn test_truncate_preview_respects_char_boundaries() {
        let text = "é".repeat(600);
        let preview = truncate_preview(&text, DEFAULT_PREVIEW_MAX_CHARS);
        assert_eq!(preview.chars().count(), DEFAULT_PREVIEW_MAX_CHARS);
        assert!(preview.chars().all(|c| c == 'é'));
    }
}
