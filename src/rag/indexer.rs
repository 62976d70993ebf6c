//! Write-path indexer keeping the vector store consistent with the
//! primary post store
//!
//! Indexing is best-effort and eventually consistent: every failure is
//! logged and swallowed so the post-mutation request path is never
//! affected. A bulk [`Indexer::reindex_all`] corrects any drift.

use std::sync::Arc;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::database::Database;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::models::ReindexReport;

pub struct Indexer<E> {
    database: Arc<Database>,
    embedder: Arc<E>,
}

impl<E> Indexer<E>
where
    E: Embedder + 'static,
{
    pub fn new(database: Arc<Database>, embedder: Arc<E>) -> Self {
        Self { database, embedder }
    }

    /// Embed a post's content and upsert its vector record.
    ///
    /// Failures (embedding or storage) are logged, never propagated; a
    /// post whose content failed to embed simply has no index row.
    pub async fn index_post(&self, external_id: &str, content: &str) {
        if let Err(e) = self.try_index(external_id, content).await {
            warn!("Failed to index post {}: {}", external_id, e);
        }
    }

    async fn try_index(&self, external_id: &str, content: &str) -> Result<()> {
        let embedding = self.embedder.embed(content).await?;
        self.database
            .upsert_post_vector(external_id, content, embedding)
            .await
    }

    /// Remove a post's vector record. Failures logged, never propagated.
    pub async fn remove_index(&self, external_id: &str) {
        if let Err(e) = self.database.delete_post_vector(external_id).await {
            warn!("Failed to remove index for post {}: {}", external_id, e);
        }
    }

    /// Fire-and-forget variant of [`Indexer::index_post`] for the
    /// post-mutation path; the caller does not await completion.
    pub fn spawn_index(self: &Arc<Self>, external_id: String, content: String) {
        let indexer = Arc::clone(self);
        tokio::spawn(async move {
            indexer.index_post(&external_id, &content).await;
        });
    }

    /// Fire-and-forget variant of [`Indexer::remove_index`]
    pub fn spawn_remove(self: &Arc<Self>, external_id: String) {
        let indexer = Arc::clone(self);
        tokio::spawn(async move {
            indexer.remove_index(&external_id).await;
        });
    }

    /// Re-embed every post in the primary store.
    ///
    /// Per-post failures are counted as skipped, not fatal to the batch.
    pub async fn reindex_all(&self) -> Result<ReindexReport> {
        let rows = self.database.list_posts_for_index().await?;
        let total = rows.len();
        let mut indexed = 0;

        for row in rows {
            match self.try_index(&row.id, &row.content).await {
                Ok(()) => indexed += 1,
                Err(e) => error!("Reindex failed for post {}: {}", row.id, e),
            }
        }

        info!("Reindexed {}/{} posts", indexed, total);

        Ok(ReindexReport { indexed, total })
    }
}
