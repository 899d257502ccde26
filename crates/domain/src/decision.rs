//! The transient value produced by the decision policy.

use serde::{Deserialize, Serialize};

/// Requested delivery tempo for the next scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl Pacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

/// A resolved transition, consumed immediately by asset generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneDecision {
    pub next_scene_id: String,
    /// Viewer-personalized narration, when the narrator rewrote the seed.
    #[serde(default)]
    pub override_narration: Option<String>,
    #[serde(default)]
    pub mood_shift: Option<String>,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub reasoning: String,
}

impl SceneDecision {
    /// A deterministic advance with no advisory input.
    pub fn linear(next_scene_id: impl Into<String>) -> Self {
        Self {
            next_scene_id: next_scene_id.into(),
            override_narration: None,
            mood_shift: None,
            pacing: Pacing::default(),
            reasoning: String::new(),
        }
    }
}
