use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;

/// A post row in the primary post store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One indexed post in the vector store.
///
/// At most one record exists per `external_id`; upserts replace the
/// previous embedding and preview. Posts that failed to embed have no row.
#[derive(Debug, Clone, FromRow)]
pub struct PostVectorRecord {
    pub external_id: String,
    pub content_preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ephemeral similarity-search hit. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityCandidate {
    #[serde(rename = "postId")]
    pub external_id: String,
    #[serde(rename = "content")]
    pub content_preview: String,
    /// Normalized cosine similarity in [0, 1] (`1 - cosine_distance`)
    pub score: f32,
}

/// A hydrated post annotated with the similarity score of the candidate
/// that produced it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPost {
    #[serde(flatten)]
    pub post: Post,
    pub relevance_score: f32,
}

/// Outcome of a bulk reindex run
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReindexReport {
    pub indexed: usize,
    pub total: usize,
}

impl ReindexReport {
    #[must_use]
    pub fn message(&self) -> String {
        format!("Reindexed {}/{} posts", self.indexed, self.total)
    }
}
