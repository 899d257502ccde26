//! Reelwright Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelwright_domain::StoryGraph;
use reelwright_engine::infrastructure::{
    media::MediaClient,
    ollama::OllamaClient,
    ports::{LlmPort, MediaGenPort},
    resilient_llm::{ResilientLlmClient, RetryConfig},
};
use reelwright_engine::{api, App, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelwright_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Reelwright Engine");

    let config = EngineConfig::from_env();

    // Load the story once; a malformed document aborts startup.
    let story_source = std::fs::read_to_string(&config.story_path)
        .with_context(|| format!("failed to read story file '{}'", config.story_path))?;
    let graph = StoryGraph::load(&story_source)?;
    tracing::info!(
        scenes = graph.scene_count(),
        entry = %graph.entry(),
        "Story loaded"
    );

    // Create infrastructure clients
    let ollama_client = Arc::new(OllamaClient::new(&config.llm_base_url, &config.llm_model));
    let retry_config = RetryConfig::default();
    tracing::info!(
        max_retries = retry_config.max_retries,
        base_delay_ms = retry_config.base_delay_ms,
        "LLM client configured with retry"
    );
    let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(ollama_client, retry_config));
    let media: Arc<dyn MediaGenPort> = Arc::new(MediaClient::new(&config.media_base_url));

    if config.video_enabled {
        tracing::info!(
            poll_interval_secs = config.video_poll_interval.as_secs(),
            timeout_secs = config.video_timeout.as_secs(),
            "Video generation enabled"
        );
    } else {
        tracing::info!("Video generation disabled, scenes will use still images");
    }

    let app = Arc::new(App::new(graph, llm, media, config.clone())?);

    let mut router = api::http::routes()
        .route("/ws/session", get(api::websocket::ws_handler))
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(&config.cors_allowed_origins) {
        router = router.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn build_cors_layer(allowed_origins: &str) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins.trim();
    if allowed_origins.is_empty() {
        return None;
    }

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
