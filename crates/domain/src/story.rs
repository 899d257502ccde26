//! The story graph: an immutable directed graph of scenes.
//!
//! Loaded once at process start and shared read-only across all sessions.
//! Traversal is by scene id; a node either advances linearly (`next`) or,
//! when flagged as a decision point, through an emotion-keyed branch table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Fallback key in a branch table, used when the dominant emotion has no
/// mapping of its own.
pub const DEFAULT_BRANCH: &str = "default";

fn default_duration() -> u32 {
    16
}

/// A single scene record. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneNode {
    pub id: String,
    #[serde(default)]
    pub chapter: String,
    /// Seed prompt for image/video generation.
    #[serde(default)]
    pub visual_prompt: String,
    /// Scripted narration line, possibly rewritten per viewer.
    #[serde(default)]
    pub narration: String,
    #[serde(default = "default_duration")]
    pub duration_seconds: u32,
    /// Successor scene id; `None` marks an ending.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub is_decision_point: bool,
    /// Emotion -> destination scene id, only meaningful on decision points.
    #[serde(default)]
    pub branches: Option<HashMap<String, String>>,
}

impl SceneNode {
    /// An ending is a scene with no successor that is not a branch junction.
    pub fn is_ending(&self) -> bool {
        self.next.is_none() && !self.is_decision_point
    }
}

#[derive(Debug, Deserialize)]
struct StoryDocument {
    #[serde(default = "StoryDocument::default_entry")]
    entry: String,
    scenes: HashMap<String, SceneNode>,
}

impl StoryDocument {
    fn default_entry() -> String {
        "opening".to_string()
    }
}

/// The loaded scene collection plus its designated entry node.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    scenes: HashMap<String, SceneNode>,
    entry: String,
}

impl StoryGraph {
    /// Parse and validate a story document.
    ///
    /// The document must carry a top-level `scenes` object; every `next`
    /// pointer and branch destination must name an existing scene, and every
    /// decision point must carry a non-empty branch table. Violations are
    /// content errors and abort the load.
    pub fn load(source: &str) -> Result<Self, StoryError> {
        let doc: StoryDocument =
            serde_json::from_str(source).map_err(|e| StoryError::malformed(e.to_string()))?;
        let graph = Self {
            scenes: doc.scenes,
            entry: doc.entry,
        };
        graph.validate()?;
        Ok(graph)
    }

    fn validate(&self) -> Result<(), StoryError> {
        if !self.scenes.contains_key(&self.entry) {
            return Err(StoryError::malformed(format!(
                "entry scene '{}' is not in the scene collection",
                self.entry
            )));
        }
        for (key, node) in &self.scenes {
            if *key != node.id {
                return Err(StoryError::malformed(format!(
                    "scene keyed '{key}' declares id '{}'",
                    node.id
                )));
            }
            if let Some(next) = &node.next {
                if !self.scenes.contains_key(next) {
                    return Err(StoryError::malformed(format!(
                        "scene '{key}' points at unknown scene '{next}'"
                    )));
                }
            }
            if node.is_decision_point {
                let branches = node.branches.as_ref().filter(|b| !b.is_empty()).ok_or_else(
                    || {
                        StoryError::malformed(format!(
                            "decision point '{key}' has no branch table"
                        ))
                    },
                )?;
                for (emotion, destination) in branches {
                    if !self.scenes.contains_key(destination) {
                        return Err(StoryError::malformed(format!(
                            "branch '{emotion}' of '{key}' points at unknown scene '{destination}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Id of the scene every session starts from.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Look up a scene by id.
    pub fn get(&self, id: &str) -> Result<&SceneNode, StoryError> {
        self.scenes
            .get(id)
            .ok_or_else(|| StoryError::scene_not_found(id))
    }

    /// Branch table of a decision point.
    pub fn branches<'a>(
        &self,
        node: &'a SceneNode,
    ) -> Result<&'a HashMap<String, String>, StoryError> {
        if !node.is_decision_point {
            return Err(StoryError::not_a_decision_point(&node.id));
        }
        node.branches
            .as_ref()
            .ok_or_else(|| StoryError::not_a_decision_point(&node.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_json() -> String {
        serde_json::json!({
            "scenes": {
                "opening": {
                    "id": "opening",
                    "chapter": "The Arrival",
                    "narration": "The letter arrived on a Tuesday.",
                    "duration_seconds": 16,
                    "next": "foyer"
                },
                "foyer": {
                    "id": "foyer",
                    "chapter": "The Arrival",
                    "next": "crossroads"
                },
                "crossroads": {
                    "id": "crossroads",
                    "is_decision_point": true,
                    "branches": {
                        "engaged": "upstairs_door",
                        "default": "study"
                    }
                },
                "upstairs_door": { "id": "upstairs_door", "next": null },
                "study": { "id": "study", "next": null }
            }
        })
        .to_string()
    }

    #[test]
    fn load_parses_scenes_and_entry() {
        let graph = StoryGraph::load(&story_json()).unwrap();
        assert_eq!(graph.entry(), "opening");
        assert_eq!(graph.scene_count(), 5);
        assert_eq!(graph.get("foyer").unwrap().next.as_deref(), Some("crossroads"));
    }

    #[test]
    fn load_fails_without_scenes_collection() {
        let err = StoryGraph::load(r#"{"title": "no scenes here"}"#).unwrap_err();
        assert!(matches!(err, StoryError::MalformedStory(_)));
    }

    #[test]
    fn load_fails_on_dangling_next_pointer() {
        let source = serde_json::json!({
            "scenes": {
                "opening": { "id": "opening", "next": "nowhere" }
            }
        })
        .to_string();
        let err = StoryGraph::load(&source).unwrap_err();
        assert!(matches!(err, StoryError::MalformedStory(_)));
    }

    #[test]
    fn load_fails_on_decision_point_without_branches() {
        let source = serde_json::json!({
            "scenes": {
                "opening": { "id": "opening", "is_decision_point": true }
            }
        })
        .to_string();
        let err = StoryGraph::load(&source).unwrap_err();
        assert!(matches!(err, StoryError::MalformedStory(_)));
    }

    #[test]
    fn get_unknown_scene_fails() {
        let graph = StoryGraph::load(&story_json()).unwrap();
        assert_eq!(
            graph.get("attic").unwrap_err(),
            StoryError::scene_not_found("attic")
        );
    }

    #[test]
    fn branches_succeed_on_decision_point() {
        let graph = StoryGraph::load(&story_json()).unwrap();
        let node = graph.get("crossroads").unwrap();
        let branches = graph.branches(node).unwrap();
        assert!(!branches.is_empty());
        assert_eq!(branches.get("engaged").map(String::as_str), Some("upstairs_door"));
    }

    #[test]
    fn branches_fail_on_linear_scene() {
        let graph = StoryGraph::load(&story_json()).unwrap();
        let node = graph.get("foyer").unwrap();
        assert_eq!(
            graph.branches(node).unwrap_err(),
            StoryError::not_a_decision_point("foyer")
        );
    }

    #[test]
    fn ending_detection() {
        let graph = StoryGraph::load(&story_json()).unwrap();
        assert!(graph.get("study").unwrap().is_ending());
        assert!(!graph.get("foyer").unwrap().is_ending());
        assert!(!graph.get("crossroads").unwrap().is_ending());
    }
}
