//! Integration tests for the RAG search pipeline.
//!
//! These tests require a running PostgreSQL instance with the pgvector
//! extension, configured via config.toml (or config.example.toml), and
//! are ignored by default.

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use postrag::config::AppConfig;
use postrag::database::Database;
use postrag::embeddings::Embedder;
use postrag::llm::RelevanceClassifier;
use postrag::rag::Indexer;
use postrag::rag::RagService;
use postrag::rag::SearchGateway;
use postrag::rate_limit::InMemoryRateLimiter;
use postrag::PostRagError;
use postrag::Result;
use sqlx::PgPool;

const TEST_DIMENSION: usize = 384;

/// Deterministic bag-of-words embedder: hashes tokens into buckets and
/// L2-normalizes, so identical texts embed identically and texts sharing
/// tokens land close together. No network required.
struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; TEST_DIMENSION];
        for token in text.to_lowercase().split_whitespace() {
            let mut hash: usize = 5381;
            for b in token.bytes() {
                hash = hash.wrapping_mul(33).wrapping_add(b as usize);
            }
            v[hash % TEST_DIMENSION] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let v = Self::vectorize(text);
        async move { Ok(v) }
    }

    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }
}

/// Embedder that fails like a dimension-misconfigured provider
struct MismatchEmbedder;

impl Embedder for MismatchEmbedder {
    fn embed(&self, _text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send {
        async {
            Err(PostRagError::DimensionMismatch {
                expected: TEST_DIMENSION,
                actual: 256,
            })
        }
    }

    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }
}

/// Classifier returning a canned verdict
struct MockClassifier {
    response: String,
    available: bool,
}

impl MockClassifier {
    fn relevant() -> Self {
        Self {
            response: "RELEVANT".to_string(),
            available: true,
        }
    }

    fn not_relevant() -> Self {
        Self {
            response: "NOT_RELEVANT".to_string(),
            available: true,
        }
    }

    fn unavailable() -> Self {
        Self {
            response: String::new(),
            available: false,
        }
    }
}

impl RelevanceClassifier for MockClassifier {
    fn is_available(&self) -> bool {
        self.available
    }

    fn classify_relevance(
        &self,
        _system: &str,
        _user: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        let response = self.response.clone();
        async move { Ok(response) }
    }
}

async fn setup_test_db() -> Result<Arc<Database>> {
    let config = AppConfig::load()?;
    let pool = PgPool::connect(config.database_url()).await?;
    let db = Database::new(pool);
    db.init_schema(TEST_DIMENSION).await?;
    Ok(Arc::new(db))
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    // The hash embedder gives weaker cross-text similarity than a real
    // model, so retrieval tests lower the threshold
    config.search.similarity_threshold = 0.1;
    config
}

fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

async fn seed_post(db: &Database, id: &str, author: &str, content: &str, likes: i64) -> Result<()> {
    db.create_post(id, author, None, content, likes, chrono::Utc::now())
        .await
}

async fn cleanup_post(db: &Database, id: &str) {
    let _ = db.delete_post_vector(id).await;
    let _ = db.delete_post(id).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_index_then_search_self_similarity() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let indexer = Indexer::new(Arc::clone(&db), Arc::clone(&embedder));

    let id = unique_id("self-sim");
    let content = "Rust makes systems programming approachable";
    indexer.index_post(&id, content).await;

    let query_embedding = HashEmbedder::vectorize(content);
    let candidates = db.search_similar_posts(query_embedding, 1, 0.0).await?;

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].external_id, id);
    assert!(
        candidates[0].score > 0.99,
        "self-similarity should be near-maximal, got {}",
        candidates[0].score
    );

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_remove_index_excludes_post_from_search() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let indexer = Indexer::new(Arc::clone(&db), Arc::clone(&embedder));

    let id = unique_id("removed");
    let content = "ephemeral content that will be unindexed";
    indexer.index_post(&id, content).await;
    indexer.remove_index(&id).await;

    let candidates = db
        .search_similar_posts(HashEmbedder::vectorize(content), 10, 0.0)
        .await?;
    assert!(candidates.iter().all(|c| c.external_id != id));

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_upsert_is_idempotent_per_external_id() -> Result<()> {
    let db = setup_test_db().await?;

    let id = unique_id("upsert");
    db.upsert_post_vector(&id, "first version", HashEmbedder::vectorize("first version"))
        .await?;
    db.upsert_post_vector(&id, "second version", HashEmbedder::vectorize("second version"))
        .await?;

    let candidates = db
        .search_similar_posts(HashEmbedder::vectorize("second version"), 10, 0.0)
        .await?;
    let matching: Vec<_> = candidates.iter().filter(|c| c.external_id == id).collect();

    assert_eq!(matching.len(), 1, "exactly one row per external id");
    assert_eq!(matching[0].content_preview, "second version");

    let record = db.get_post_vector(&id).await?.expect("record must exist");
    assert_eq!(record.content_preview, "second version");
    assert!(record.updated_at >= record.created_at);

    cleanup_post(&db, &id).await;
    Ok(())
}

/// Poll until the vector row for `id` matches the expected presence
async fn wait_for_index_state(db: &Database, id: &str, indexed: bool) -> bool {
    for _ in 0..100 {
        if let Ok(record) = db.get_post_vector(id).await {
            if record.is_some() == indexed {
                return true;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    false
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_spawned_indexing_completes_off_the_caller_path() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let indexer = Arc::new(Indexer::new(Arc::clone(&db), embedder));

    let id = unique_id("spawned");
    // Returns immediately; embed and upsert run on a detached task
    indexer.spawn_index(id.clone(), "content indexed in the background".to_string());
    assert!(
        wait_for_index_state(&db, &id, true).await,
        "spawned index task should eventually write the vector row"
    );

    indexer.spawn_remove(id.clone());
    assert!(
        wait_for_index_state(&db, &id, false).await,
        "spawned remove task should eventually delete the vector row"
    );

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_schema_check_reports_initialized_tables() -> Result<()> {
    let db = setup_test_db().await?;
    assert!(db.is_schema_initialized().await?);
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_upsert_truncates_preview_to_configured_bound() -> Result<()> {
    let config = AppConfig::load()?;
    let pool = PgPool::connect(config.database_url()).await?;
    let db = Database::with_preview_bound(pool, 32);
    db.init_schema(TEST_DIMENSION).await?;

    let id = unique_id("preview-bound");
    let content = "z".repeat(200);
    db.upsert_post_vector(&id, &content, HashEmbedder::vectorize(&content))
        .await?;

    let record = db.get_post_vector(&id).await?.expect("record must exist");
    assert_eq!(record.content_preview.chars().count(), 32);

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_dimension_mismatch_writes_no_record() -> Result<()> {
    let db = setup_test_db().await?;
    let indexer = Indexer::new(Arc::clone(&db), Arc::new(MismatchEmbedder));

    let id = unique_id("mismatch");
    // Fails inside the embedder, is logged, and must leave no row behind
    indexer.index_post(&id, "some content").await;

    let candidates = db
        .search_similar_posts(HashEmbedder::vectorize("some content"), 10, 0.0)
        .await?;
    assert!(candidates.iter().all(|c| c.external_id != id));

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_keyword_fallback_ordering_and_no_vector_calls() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let config = test_config();

    let popular = unique_id("fb-popular");
    let recent = unique_id("fb-recent");
    let unrelated = unique_id("fb-unrelated");
    seed_post(&db, &popular, "Ada", "alpha release notes", 10).await?;
    seed_post(&db, &recent, "Bob", "beta testing feedback", 1).await?;
    seed_post(&db, &unrelated, "Eve", "nothing to see here", 99).await?;

    let rag = RagService::new(
        Arc::clone(&db),
        Arc::clone(&embedder),
        Arc::new(MockClassifier::unavailable()),
        &config,
    );
    let gateway = SearchGateway::new(
        rag,
        Arc::clone(&db),
        InMemoryRateLimiter::new(100, std::time::Duration::from_secs(60)),
        &config,
    );

    let outcome = gateway.smart_search("user-fb", "alpha beta xy").await?;
    match outcome {
        postrag::rag::SearchOutcome::Fallback(posts) => {
            let ids: Vec<_> = posts.iter().map(|p| p.id.clone()).collect();
            assert!(ids.contains(&popular));
            assert!(ids.contains(&recent));
            assert!(!ids.contains(&unrelated));
            // Popularity before recency
            let popular_idx = ids.iter().position(|i| *i == popular).unwrap();
            let recent_idx = ids.iter().position(|i| *i == recent).unwrap();
            assert!(popular_idx < recent_idx);
        }
        postrag::rag::SearchOutcome::Rag(_) => panic!("expected fallback outcome"),
    }

    // Fallback path never embeds
    assert_eq!(embedder.call_count(), 0);

    cleanup_post(&db, &popular).await;
    cleanup_post(&db, &recent).await;
    cleanup_post(&db, &unrelated).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_end_to_end_relevant_verdict_returns_posts() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let config = test_config();

    let id = unique_id("e2e");
    let content = "The quick brown fox";
    seed_post(&db, &id, "Ada", content, 0).await?;

    let indexer = Indexer::new(Arc::clone(&db), Arc::clone(&embedder));
    indexer.index_post(&id, content).await;

    let rag = RagService::new(
        Arc::clone(&db),
        Arc::clone(&embedder),
        Arc::new(MockClassifier::relevant()),
        &config,
    );

    let result = rag.rag_search("fox jumping").await?;
    assert!(!result.no_results);
    let posts = result.posts.expect("relevant verdict must hydrate posts");
    assert!(posts.iter().any(|p| p.post.id == id));
    let ranked = posts.iter().find(|p| p.post.id == id).unwrap();
    assert!(ranked.relevance_score > 0.0);
    assert!(result.sources.iter().any(|s| s.external_id == id));

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_end_to_end_not_relevant_verdict_suppresses_posts() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let config = test_config();

    let id = unique_id("e2e-neg");
    let content = "The quick brown fox";
    seed_post(&db, &id, "Ada", content, 0).await?;

    let indexer = Indexer::new(Arc::clone(&db), Arc::clone(&embedder));
    indexer.index_post(&id, content).await;

    let rag = RagService::new(
        Arc::clone(&db),
        Arc::clone(&embedder),
        Arc::new(MockClassifier::not_relevant()),
        &config,
    );

    let result = rag.rag_search("fox jumping").await?;
    assert!(result.no_results);
    assert!(result.posts.is_none());
    assert!(result.sources.is_empty());
    assert!(result.answer.is_some());

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with pgvector"]
async fn test_dangling_candidates_are_dropped_during_hydration() -> Result<()> {
    let db = setup_test_db().await?;
    let embedder = Arc::new(HashEmbedder::new());
    let config = test_config();

    let id = unique_id("dangling");
    let content = "post deleted while search was in flight";
    // Vector row exists but the primary-store post does not
    db.upsert_post_vector(&id, content, HashEmbedder::vectorize(content))
        .await?;

    let rag = RagService::new(
        Arc::clone(&db),
        Arc::clone(&embedder),
        Arc::new(MockClassifier::relevant()),
        &config,
    );

    let result = rag.rag_search(content).await?;
    assert!(result.no_results, "only-dangling candidates mean no match");
    assert!(result.sources.iter().all(|s| s.external_id != id));

    cleanup_post(&db, &id).await;
    Ok(())
}

#[tokio::test]
async fn test_gateway_rate_limit_and_validation() -> Result<()> {
    // connect_lazy: no live database needed, both rejections happen
    // before any query is issued
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgresql://localhost/unreachable")
        .map_err(PostRagError::from)?;
    let db = Arc::new(Database::new(pool));
    let config = test_config();

    let rag = RagService::new(
        Arc::clone(&db),
        Arc::new(HashEmbedder::new()),
        Arc::new(MockClassifier::unavailable()),
        &config,
    );
    let gateway = SearchGateway::new(
        rag,
        Arc::clone(&db),
        InMemoryRateLimiter::new(2, std::time::Duration::from_secs(60)),
        &config,
    );

    let err = gateway.smart_search("user-x", "   ").await.unwrap_err();
    assert!(matches!(err, PostRagError::Validation(_)));

    // Validation rejections still consumed the window budget above
    let _ = gateway.smart_search("user-x", " ").await;
    let err = gateway.smart_search("user-x", "anything").await.unwrap_err();
    assert!(matches!(err, PostRagError::RateLimitExceeded));

    Ok(())
}
