//! Session registry.
//!
//! Tracks every live viewer session under a stable `SessionId` so sessions
//! can be listed, inspected, or expired independently of the transport
//! connection objects that carry them.

use dashmap::DashMap;
use serde::Serialize;

use reelwright_domain::SessionId;

/// Lifecycle position of one session's protocol handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Connected, nothing started yet.
    Idle,
    /// Start/reset received, opening scene generating.
    AwaitingOpening,
    Playing,
    /// Transient: a branch decision is in flight.
    Deciding,
    Complete,
}

/// Registry snapshot of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    pub genre: String,
    pub current_scene_id: String,
    pub scenes_played: usize,
    pub readings: usize,
}

/// All live sessions, shared across connection handlers.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionInfo>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, info: SessionInfo) {
        self.sessions.insert(info.session_id, info);
    }

    pub fn remove(&self, session_id: &SessionId) {
        if self.sessions.remove(session_id).is_some() {
            tracing::debug!(session_id = %session_id, "Session unregistered");
        }
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionInfo> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    pub fn list(&self) -> Vec<SessionInfo> {
        self.sessions.iter().map(|entry| entry.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
