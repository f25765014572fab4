//! Enchanted Reader - interactive branching stories for children
//!
//! A Rust backend implementing a story session state machine over
//! hosted text, image and speech models.

mod api;
mod config;
mod export;
mod llm;
mod media;
mod runtime;
mod state_machine;
mod story;
mod title_generator;

use api::{create_router, AppState};
use config::AppConfig;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enchanted_reader=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env();
    tracing::info!(
        max_turns = config.story.max_turns,
        default_creativity = config.story.default_creativity,
        idle_timeout_secs = config.story.idle_timeout.as_secs(),
        gateway = config.llm.gateway.is_some(),
        "Configuration loaded"
    );

    // Create application state
    let state = AppState::from_config(&config);
    let _idle_sweep = state.sessions.spawn_idle_sweep();

    if state.llm_registry.has_models() {
        tracing::info!(
            models = ?state.llm_registry.available_models(),
            default = %state.llm_registry.default_model_id(),
            "Model registry initialized"
        );
    } else {
        tracing::warn!("No text model configured. Set OPENAI_API_KEY or LLM_GATEWAY.");
    }

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(compression),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Enchanted Reader listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
