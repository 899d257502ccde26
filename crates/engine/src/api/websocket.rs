//! WebSocket session protocol.
//!
//! One handler per viewer connection. Inbound messages are processed to
//! completion one at a time; the only work that escapes that ordering is
//! the detached prefetch task, which races later messages on purpose and
//! lands its result in the shared asset cache.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use reelwright_domain::{
    EmotionAccumulator, EmotionReading, SceneDecision, SceneNode, SessionId, SessionState,
};
use reelwright_shared::{ClientMessage, ServerMessage};

use crate::api::sessions::{SessionInfo, SessionPhase};
use crate::app::App;

/// Buffer size for the per-session outbound channel.
const SESSION_CHANNEL_BUFFER: usize = 64;

/// Genre applied when a start message does not choose one.
const DEFAULT_GENRE: &str = "mystery";

/// WebSocket upgrade handler - entry point for new viewer connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<Arc<App>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

/// Everything one session owns. Lives on the handler's stack; a snapshot is
/// mirrored into the registry after every message.
struct SessionContext {
    id: SessionId,
    state: SessionState,
    accumulator: EmotionAccumulator,
    frame_count: u32,
    phase: SessionPhase,
}

impl SessionContext {
    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            phase: self.phase,
            genre: self.state.genre.clone(),
            current_scene_id: self.state.current_scene_id.clone(),
            scenes_played: self.state.scenes_played.len(),
            readings: self.accumulator.len(),
        }
    }
}

async fn handle_socket(socket: WebSocket, app: Arc<App>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let session_id = SessionId::new();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(SESSION_CHANNEL_BUFFER);

    // Forward outbound messages from the channel to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut ctx = match initial_context(&app, session_id) {
        Ok(ctx) => ctx,
        Err(e) => {
            // Only possible with a graph whose entry went missing, which
            // load-time validation rules out.
            tracing::error!(session_id = %session_id, error = %e, "Failed to build session context");
            send_task.abort();
            return;
        }
    };
    app.registry.upsert(ctx.info());
    tracing::info!(session_id = %session_id, "Session connected");

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session_id,
                            error = %e,
                            "Ignoring malformed session message"
                        );
                        continue;
                    }
                };
                if let Err(e) = handle_message(&app, &mut ctx, &tx, msg).await {
                    tracing::error!(
                        session_id = %session_id,
                        scene_id = %ctx.state.current_scene_id,
                        error = %e,
                        "Session handler failed"
                    );
                    let _ = tx
                        .send(ServerMessage::Error {
                            message: "Internal server error".to_string(),
                        })
                        .await;
                    break;
                }
                app.registry.upsert(ctx.info());
            }
            Ok(Message::Close(_)) => {
                tracing::info!(session_id = %session_id, "Session closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // An in-flight prefetch keeps running; its result lands in the shared
    // cache and is simply never sent to this viewer.
    app.registry.remove(&session_id);
    send_task.abort();
    tracing::info!(session_id = %session_id, "Session terminated");
}

fn initial_context(app: &App, id: SessionId) -> anyhow::Result<SessionContext> {
    Ok(SessionContext {
        id,
        state: app.initial_session_state(Some(DEFAULT_GENRE))?,
        accumulator: EmotionAccumulator::new(),
        frame_count: 0,
        phase: SessionPhase::Idle,
    })
}

async fn handle_message(
    app: &Arc<App>,
    ctx: &mut SessionContext,
    tx: &mpsc::Sender<ServerMessage>,
    msg: ClientMessage,
) -> anyhow::Result<()> {
    match msg {
        ClientMessage::Start { genre } => {
            let genre = genre.unwrap_or_else(|| DEFAULT_GENRE.to_string());
            start_story(app, ctx, tx, genre).await
        }
        ClientMessage::Reset => {
            let genre = ctx.state.genre.clone();
            start_story(app, ctx, tx, genre).await
        }
        ClientMessage::Frame { data } => {
            let reading = app.classifier.classify_frame(&data).await;
            ingest_reading(app, ctx, tx, reading).await
        }
        ClientMessage::Emotion { data } => {
            if !data.is_valid() {
                tracing::warn!(session_id = %ctx.id, "Ignoring out-of-range emotion reading");
                return Ok(());
            }
            ingest_reading(app, ctx, tx, data).await
        }
    }
}

/// (Re)initialize the session and play the opening scene.
async fn start_story(
    app: &Arc<App>,
    ctx: &mut SessionContext,
    tx: &mpsc::Sender<ServerMessage>,
    genre: String,
) -> anyhow::Result<()> {
    ctx.state = app.initial_session_state(Some(&genre))?;
    ctx.accumulator = EmotionAccumulator::new();
    ctx.frame_count = 0;
    ctx.phase = SessionPhase::AwaitingOpening;

    // Replays regenerate fresh assets, e.g. after a genre change.
    app.content.clear();

    let opening = app.graph.get(app.graph.entry())?.clone();
    let decision = SceneDecision::linear(opening.id.clone());
    let assets = app.content.generate(&decision, &opening, &ctx.state.genre).await;
    send(tx, ServerMessage::Scene {
        assets: (*assets).clone(),
    })
    .await?;
    ctx.phase = SessionPhase::Playing;

    spawn_prefetch(app, opening, ctx.state.genre.clone());
    Ok(())
}

/// Record one perception sample, echo it back, and advance the story if the
/// current scene has run its course.
async fn ingest_reading(
    app: &Arc<App>,
    ctx: &mut SessionContext,
    tx: &mpsc::Sender<ServerMessage>,
    reading: EmotionReading,
) -> anyhow::Result<()> {
    send(tx, ServerMessage::Emotion {
        data: reading.clone(),
    })
    .await?;
    ctx.accumulator.add(reading);
    ctx.frame_count += 1;

    maybe_advance(app, ctx, tx).await
}

async fn maybe_advance(
    app: &Arc<App>,
    ctx: &mut SessionContext,
    tx: &mpsc::Sender<ServerMessage>,
) -> anyhow::Result<()> {
    let current = app.graph.get(&ctx.state.current_scene_id)?.clone();
    let frames_needed = (current.duration_seconds / app.config.seconds_per_sample).max(1);
    if ctx.frame_count < frames_needed {
        return Ok(());
    }
    let Some(next_id) = current.next.as_deref() else {
        return Ok(());
    };

    let next_node = app.graph.get(next_id)?;
    let mut decision = if next_node.is_decision_point {
        ctx.phase = SessionPhase::Deciding;
        send(tx, ServerMessage::Deciding).await?;
        app.director
            .decide(&ctx.accumulator.summarize(), &ctx.state, &app.graph)
            .await?
    } else {
        // Linear advance - no advisory call needed.
        SceneDecision::linear(next_node.id.clone())
    };

    ctx.state = ctx.state.advance(decision.next_scene_id.as_str());
    let new_scene = app.graph.get(&decision.next_scene_id)?.clone();

    if !ctx.accumulator.is_empty() && !new_scene.narration.is_empty() {
        let adapted = app
            .narrator
            .adapt_narration(
                &new_scene.narration,
                decision.mood_shift.as_deref(),
                decision.pacing,
                &ctx.accumulator.summarize(),
                &ctx.state.scenes_played,
                &ctx.state.genre,
            )
            .await;
        decision.override_narration = Some(adapted);
    }

    let assets = app
        .content
        .generate(&decision, &new_scene, &ctx.state.genre)
        .await;
    ctx.frame_count = 0;
    spawn_prefetch(app, new_scene.clone(), ctx.state.genre.clone());

    send(tx, ServerMessage::Scene {
        assets: (*assets).clone(),
    })
    .await?;

    if new_scene.is_ending() {
        ctx.phase = SessionPhase::Complete;
        send(tx, ServerMessage::Complete {
            ending: new_scene.id.clone(),
            scenes_played: ctx.state.scenes_played.clone(),
        })
        .await?;
    } else {
        ctx.phase = SessionPhase::Playing;
    }
    Ok(())
}

/// Fire-and-forget generation of the next linear scene while the current one
/// plays, so the transition finds a warm cache.
fn spawn_prefetch(app: &Arc<App>, scene: SceneNode, genre: String) {
    let content = Arc::clone(&app.content);
    tokio::spawn(async move {
        content.prefetch(&scene, &genre).await;
    });
}

async fn send(tx: &mpsc::Sender<ServerMessage>, msg: ServerMessage) -> anyhow::Result<()> {
    tx.send(msg)
        .await
        .map_err(|_| anyhow::anyhow!("session channel closed"))
}
