mod config;
mod documents;
mod errors;
mod llm_client;
mod ranking;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::documents::FileDocumentProcessor;
use crate::llm_client::LlmClient;
use crate::ranking::name_policy::NamePolicy;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Ranker API v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let name_policy =
        NamePolicy::default().with_confidence_threshold(config.name_confidence_threshold);
    info!(
        "Name policy: confidence >= {}, max {} chars",
        name_policy.confidence_threshold, name_policy.max_name_chars
    );
    info!(
        "Processing up to {} resumes concurrently, {} bytes per file",
        config.max_concurrent_resumes, config.max_upload_bytes
    );

    let state = AppState {
        config: config.clone(),
        completion: Arc::new(llm),
        documents: Arc::new(FileDocumentProcessor::new(config.max_upload_bytes)),
        name_policy: Arc::new(name_policy),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
