//! HTTP server implementation

use std::sync::Arc;

use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::llm::LlmClient;
use crate::rag::Indexer;
use crate::rag::RagService;
use crate::rag::SearchGateway;
use crate::rate_limit::InMemoryRateLimiter;
use crate::Result;

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("Starting postrag API server...");

    // Initialize services
    let database = Arc::new(Database::from_config(config).await?);

    // Schema init failure leaves search degraded but keeps the server up
    if let Err(e) = database.init_schema(config.embedding_dimension()).await {
        warn!("Schema initialization failed: {}", e);
        match database.is_schema_initialized().await {
            Ok(true) => info!("Existing schema found, continuing with current tables"),
            Ok(false) => {
                warn!("Schema tables missing, search runs degraded until `postrag init` succeeds");
            }
            Err(e) => warn!("Schema check failed: {}", e),
        }
    }

    let embedder = Arc::new(EmbeddingService::new(config));
    let llm = Arc::new(LlmClient::new(config)?);

    if !config.llm_available() {
        warn!("No LLM API key configured; searches will use the keyword fallback");
    }

    // Warm the embedding model off the request path
    {
        let embedder = Arc::clone(&embedder);
        tokio::spawn(async move {
            if let Err(e) = embedder.preload().await {
                warn!("Embedding model preload failed: {}", e);
            }
        });
    }

    let rag = RagService::new(
        Arc::clone(&database),
        Arc::clone(&embedder),
        Arc::clone(&llm),
        config,
    );
    let limiter = InMemoryRateLimiter::from_config(&config.rate_limit);
    let gateway = Arc::new(SearchGateway::new(
        rag,
        Arc::clone(&database),
        limiter,
        config,
    ));
    let indexer = Arc::new(Indexer::new(Arc::clone(&database), Arc::clone(&embedder)));

    let state = AppState { gateway, indexer };

    let mut app = routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health      - Health check");
    info!("  POST /ai/search   - Semantic search (keyword fallback when LLM is unconfigured)");
    info!("  POST /ai/reindex  - Re-embed all posts");

    axum::serve(listener, app).await?;

    Ok(())
}
