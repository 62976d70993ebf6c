use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use postrag::config::AppConfig;
use postrag::database::Database;
use postrag::embeddings::EmbeddingService;
use postrag::llm::LlmClient;
use postrag::rag::Indexer;
use postrag::rag::RagService;
use postrag::rag::SearchGateway;
use postrag::rag::SearchOutcome;
use postrag::rate_limit::InMemoryRateLimiter;
use postrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "postrag")]
#[command(about = "RAG semantic search over social posts: index, search, serve")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema (idempotent)
    Init,
    /// Start the HTTP API server
    Serve {
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Enable permissive CORS
        #[arg(long)]
        cors: bool,
    },
    /// Run a search from the command line
    Search {
        /// The search query
        query: String,
        /// User id used for rate limiting
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Index a single post's content
    Index {
        /// Post id in the primary store
        id: String,
        /// Post content to embed
        content: String,
    },
    /// Remove a post from the vector index
    Remove {
        /// Post id in the primary store
        id: String,
    },
    /// Re-embed every post in the primary store
    Reindex,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;

    if cli.verbose {
        postrag::logging::init_logging_with_config(None)?;
    } else {
        postrag::logging::init_logging_with_config(Some(&config))?;
    }

    match cli.command {
        Commands::Init => {
            let database = Database::from_config(&config).await?;
            database.init_schema(config.embedding_dimension()).await?;
            let posts = database.count_posts().await?;
            let indexed = database.count_post_vectors().await?;
            info!(
                "Database schema initialized ({} posts, {} indexed)",
                posts, indexed
            );
        }
        Commands::Serve { host, port, cors } => {
            postrag::api::serve_api(&config, host, port, cors).await?;
        }
        Commands::Search { query, user } => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedder = Arc::new(EmbeddingService::new(&config));
            let llm = Arc::new(LlmClient::new(&config)?);
            let rag = RagService::new(
                Arc::clone(&database),
                Arc::clone(&embedder),
                llm,
                &config,
            );
            let limiter = InMemoryRateLimiter::from_config(&config.rate_limit);
            let gateway = SearchGateway::new(rag, database, limiter, &config);

            match gateway.smart_search(&user, &query).await? {
                SearchOutcome::Rag(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                SearchOutcome::Fallback(posts) => {
                    println!("(keyword fallback, {} posts)", posts.len());
                    for post in posts {
                        println!(
                            "- [{}] {} ({} likes): {}",
                            post.id, post.author_name, post.likes_count, post.content
                        );
                    }
                }
            }
        }
        Commands::Index { id, content } => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedder = Arc::new(EmbeddingService::new(&config));
            let indexer = Indexer::new(database, embedder);
            indexer.index_post(&id, &content).await;
            info!("Index request completed for post {}", id);
        }
        Commands::Remove { id } => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedder = Arc::new(EmbeddingService::new(&config));
            let indexer = Indexer::new(database, embedder);
            indexer.remove_index(&id).await;
            info!("Removed index for post {}", id);
        }
        Commands::Reindex => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedder = Arc::new(EmbeddingService::new(&config));
            let indexer = Indexer::new(database, embedder);
            let report = indexer.reindex_all().await?;
            println!("{}", report.message());
        }
    }

    Ok(())
}
