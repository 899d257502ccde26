//! HTTP routes.
//!
//! The stateless per-call alternative to the session transport, plus health
//! and debugging surfaces. Data-integrity errors map to status codes here;
//! collaborator failures never surface at all.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use reelwright_domain::{
    EmotionReading, EmotionSummary, SceneAssets, SceneDecision, SceneNode, SessionState,
    StoryError,
};
use reelwright_shared::{FrameInput, GenerateRequest};

use crate::api::sessions::SessionInfo;
use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/emotion", post(classify_emotion))
        .route("/api/director/decide", post(decide_branch))
        .route("/api/content/generate", post(generate_assets))
        .route("/api/story/scene/{id}", get(get_scene))
        .route("/api/story/state", get(get_state))
        .route("/api/story/reset", post(reset_state))
        .route("/api/sessions", get(list_sessions))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn classify_emotion(
    State(app): State<Arc<App>>,
    Json(body): Json<FrameInput>,
) -> Json<EmotionReading> {
    Json(app.classifier.classify_frame(&body.image_base64).await)
}

async fn decide_branch(
    State(app): State<Arc<App>>,
    Json(summary): Json<EmotionSummary>,
) -> Result<Json<SceneDecision>, ApiError> {
    let state = app.rest_state.read().await.clone();
    let decision = app.director.decide(&summary, &state, &app.graph).await?;
    Ok(Json(decision))
}

async fn generate_assets(
    State(app): State<Arc<App>>,
    Json(request): Json<GenerateRequest>,
) -> Json<SceneAssets> {
    let genre = app.rest_state.read().await.genre.clone();
    let assets = app
        .content
        .generate(&request.decision, &request.scene, &genre)
        .await;
    Json((*assets).clone())
}

async fn get_scene(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<SceneNode>, ApiError> {
    Ok(Json(app.graph.get(&id)?.clone()))
}

async fn get_state(State(app): State<Arc<App>>) -> Json<SessionState> {
    Json(app.rest_state.read().await.clone())
}

async fn reset_state(State(app): State<Arc<App>>) -> Result<Json<SessionState>, ApiError> {
    let fresh = app.initial_session_state(None)?;
    *app.rest_state.write().await = fresh.clone();
    app.content.clear();
    tracing::info!("REST story state reset, asset cache cleared");
    Ok(Json(fresh))
}

async fn list_sessions(State(app): State<Arc<App>>) -> Json<Vec<SessionInfo>> {
    Json(app.registry.list())
}

// =============================================================================
// Error handling
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<StoryError> for ApiError {
    fn from(e: StoryError) -> Self {
        match e {
            StoryError::SceneNotFound { .. } => ApiError::NotFound(e.to_string()),
            StoryError::MalformedStory(_) | StoryError::NotADecisionPoint { .. } => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}
