//! Per-session narrative state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity for a viewer session, independent of the transport
/// connection that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where one viewer currently is in the story.
///
/// Owned exclusively by one session. Advancing produces a new value rather
/// than mutating in place, so a handler mid-generation never observes a
/// half-updated state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    pub current_scene_id: String,
    /// Scene ids already played, in order. Append-only.
    pub scenes_played: Vec<String>,
    pub chapter: String,
    /// Free-form style tag, fixed for the session unless a restart changes it.
    pub genre: String,
}

impl SessionState {
    pub fn new(
        entry_scene_id: impl Into<String>,
        chapter: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            current_scene_id: entry_scene_id.into(),
            scenes_played: Vec::new(),
            chapter: chapter.into(),
            genre: genre.into(),
        }
    }

    /// Move to the next scene, recording the one just left in the history.
    pub fn advance(&self, next_scene_id: impl Into<String>) -> Self {
        let mut scenes_played = self.scenes_played.clone();
        scenes_played.push(self.current_scene_id.clone());
        Self {
            current_scene_id: next_scene_id.into(),
            scenes_played,
            chapter: self.chapter.clone(),
            genre: self.genre.clone(),
        }
    }
}
