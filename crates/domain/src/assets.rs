//! Generated scene assets and their cache addressing.

use serde::{Deserialize, Serialize};

use crate::decision::SceneDecision;

/// Everything the viewer needs to play one scene. Immutable once built.
///
/// Video and image are mutually exclusive: video takes precedence, the image
/// is its fallback. Any field may be absent after degradation; an all-empty
/// result is still valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneAssets {
    pub scene_id: String,
    /// Base64-encoded mp4 clip.
    pub video: Option<String>,
    /// Base64-encoded still image, populated only when video is absent.
    pub image: Option<String>,
    /// Base64-encoded wav narration.
    pub audio: Option<String>,
    pub narration_text: String,
    pub mood: String,
    pub chapter: String,
    pub duration_seconds: u32,
}

/// Composite cache key for generated assets.
///
/// Two decisions reaching the same scene with a different mood or narration
/// must never collide, so both are part of the key; absent components
/// default to an empty marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    scene_id: String,
    genre: String,
    mood: String,
    narration: String,
}

impl AssetKey {
    pub fn for_scene(scene_id: &str, genre: &str, decision: &SceneDecision) -> Self {
        Self {
            scene_id: scene_id.to_string(),
            genre: genre.to_string(),
            mood: decision.mood_shift.clone().unwrap_or_default(),
            narration: decision.override_narration.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_scene_same_decision_keys_collide() {
        let decision = SceneDecision::linear("foyer");
        let a = AssetKey::for_scene("foyer", "mystery", &decision);
        let b = AssetKey::for_scene("foyer", "mystery", &decision);
        assert_eq!(a, b);
    }

    #[test]
    fn mood_and_narration_distinguish_keys() {
        let plain = SceneDecision::linear("foyer");
        let mut moody = SceneDecision::linear("foyer");
        moody.mood_shift = Some("tense".to_string());
        let mut rewritten = SceneDecision::linear("foyer");
        rewritten.override_narration = Some("A new line.".to_string());

        let base = AssetKey::for_scene("foyer", "mystery", &plain);
        assert_ne!(base, AssetKey::for_scene("foyer", "mystery", &moody));
        assert_ne!(base, AssetKey::for_scene("foyer", "mystery", &rewritten));
        assert_ne!(base, AssetKey::for_scene("foyer", "horror", &plain));
    }
}
