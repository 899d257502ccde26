//! Request bodies for the stateless REST surface.

use serde::{Deserialize, Serialize};

use reelwright_domain::{SceneDecision, SceneNode};

/// A single webcam frame submitted for classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInput {
    pub image_base64: String,
}

/// A decision plus its target scene, submitted for asset generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub decision: SceneDecision,
    pub scene: SceneNode,
}
