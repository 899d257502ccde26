//! Data-integrity errors for story content.
//!
//! These are the only errors the engine ever surfaces to callers. Every
//! external-collaborator failure is degraded to a safe default at the call
//! site instead.

use thiserror::Error;

/// Errors raised by story loading and graph lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoryError {
    /// The story document is missing required structure or references
    /// scenes that do not exist. Fatal at startup.
    #[error("Malformed story document: {0}")]
    MalformedStory(String),

    /// A scene id was requested that is absent from the loaded graph.
    #[error("Scene '{id}' not found in story data")]
    SceneNotFound { id: String },

    /// Branch tables were requested for a node that is not a decision point.
    #[error("Scene '{id}' is not a decision point")]
    NotADecisionPoint { id: String },
}

impl StoryError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedStory(msg.into())
    }

    pub fn scene_not_found(id: impl Into<String>) -> Self {
        Self::SceneNotFound { id: id.into() }
    }

    pub fn not_a_decision_point(id: impl Into<String>) -> Self {
        Self::NotADecisionPoint { id: id.into() }
    }
}
