//! Primary post store queries
//!
//! The post CRUD surface itself lives with the post-management
//! collaborator; this module covers only what the search pipeline needs:
//! hydration, keyword fallback, and enumeration for bulk reindexing.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;

use super::Database;
use crate::models::Post;
use crate::Result;

/// Minimal row used when enumerating posts for reindexing
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostContentRow {
    pub id: String,
    pub content: String,
}

impl Database {
    /// Insert a post into the primary store
    pub async fn create_post(
        &self,
        id: &str,
        author_name: &str,
        author_email: Option<&str>,
        content: &str,
        likes_count: i64,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO posts (id, author_name, author_email, content, likes_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(author_name)
        .bind(author_email)
        .bind(content)
        .bind(likes_count)
        .bind(created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete a post from the primary store
    pub async fn delete_post(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Hydrate posts by id, keyed for order-preserving lookup.
    ///
    /// Ids that no longer resolve are simply absent from the map; callers
    /// drop dangling candidates silently.
    pub async fn get_posts_by_ids(&self, ids: &[String]) -> Result<HashMap<String, Post>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let posts = sqlx::query_as::<_, Post>(
            r"
            SELECT id, author_name, author_email, content, likes_count, created_at
            FROM posts
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await?;

        Ok(posts.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    /// Case-insensitive substring search used by the keyword fallback,
    /// ordered by popularity then recency
    pub async fn keyword_search_posts(&self, terms: &[String], limit: i64) -> Result<Vec<Post>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let patterns: Vec<String> = terms
            .iter()
            .map(|t| format!("%{}%", escape_like_pattern(t)))
            .collect();

        let posts = sqlx::query_as::<_, Post>(
            r"
            SELECT id, author_name, author_email, content, likes_count, created_at
            FROM posts
            WHERE content ILIKE ANY($1)
            ORDER BY likes_count DESC, created_at DESC
            LIMIT $2
            ",
        )
        .bind(&patterns)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(posts)
    }

    /// Enumerate all posts for bulk reindexing
    pub async fn list_posts_for_index(&self) -> Result<Vec<PostContentRow>> {
        let rows = sqlx::query_as::<_, PostContentRow>("SELECT id, content FROM posts")
            .fetch_all(self.pool())
            .await?;

        Ok(rows)
    }

    /// Count posts in the primary store
    pub async fn count_posts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

/// Escape LIKE metacharacters so search terms match literally
fn escape_like_pattern(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("plain"), "plain");
        assert_eq!(escape_like_pattern("50%"), "50\\%");
        assert_eq!(escape_like_pattern("a_b"), "a\\_b");
        assert_eq!(escape_like_pattern("back\\slash"), "back\\\\slash");
    }
}
