mod config;
mod embeddings;
mod errors;
mod extract;
mod llm_client;
mod pipeline;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embeddings::OpenAiEmbedder;
use crate::llm_client::AnthropicClient;
use crate::pipeline::runner::{PipelineRunner, RunnerOptions};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::ResumeStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Tracing targets use underscores, the package name uses a hyphen.
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting copilot-api v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the completion client
    let llm = Arc::new(AnthropicClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_model.clone(),
        config.request_timeout_secs,
    ));
    info!("LLM client initialized (model: {})", config.anthropic_model);

    // Initialize the embedder and resume store
    let embedder = Arc::new(OpenAiEmbedder::new(
        config.embeddings_api_key.clone(),
        config.embeddings_api_base.clone(),
        config.embeddings_model.clone(),
        config.request_timeout_secs,
    ));
    let store = Arc::new(ResumeStore::new(embedder));
    info!("Resume store initialized (model: {})", config.embeddings_model);

    // Initialize the pipeline runner with its knobs from config
    let runner = Arc::new(PipelineRunner::new(
        llm,
        store.clone(),
        RunnerOptions {
            schema_retry_limit: config.schema_retry_limit,
            retrieval_top_k: config.retrieval_top_k,
        },
    ));

    // Build app state
    let state = AppState {
        store,
        runner,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
