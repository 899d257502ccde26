//! Branch decision policy.
//!
//! Linear advances are resolved deterministically with no external call.
//! At a decision point the emotion-mapped fallback is computed first, then
//! an advisory LLM call may confirm or override it; the advisory result is
//! validated against the graph and any failure falls back silently. Only
//! graph-lookup errors can surface from here.

use std::sync::Arc;

use serde::Deserialize;

use reelwright_domain::{
    EmotionSummary, Pacing, SceneDecision, SessionState, StoryError, StoryGraph,
};
use reelwright_domain::story::DEFAULT_BRANCH;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest};
use crate::use_cases::strip_json_fences;

const DECIDE_TEMPERATURE: f32 = 0.8;

/// The advisory-backed decision policy.
pub struct Director {
    llm: Arc<dyn LlmPort>,
}

impl Director {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    /// Resolve the next scene for a session.
    pub async fn decide(
        &self,
        summary: &EmotionSummary,
        state: &SessionState,
        graph: &StoryGraph,
    ) -> Result<SceneDecision, StoryError> {
        let current = graph.get(&state.current_scene_id)?;

        // Story over: stay put, the caller reads this as terminal.
        let Some(next_id) = &current.next else {
            return Ok(SceneDecision::linear(state.current_scene_id.clone()));
        };

        let next = graph.get(next_id)?;
        if !next.is_decision_point {
            return Ok(SceneDecision::linear(next.id.clone()));
        }

        let branches = graph.branches(next)?;
        let mapped = branches
            .get(summary.dominant_emotion.as_str())
            .or_else(|| branches.get(DEFAULT_BRANCH))
            .or_else(|| branches.values().next());
        // An empty table is rejected at load; stay put as a last resort.
        let Some(pre_selected) = mapped.cloned() else {
            return Ok(SceneDecision::linear(state.current_scene_id.clone()));
        };

        match self.advise(summary, state, branches, &pre_selected).await {
            Ok(decision) => {
                if graph.get(&decision.next_scene_id).is_ok() {
                    Ok(decision)
                } else {
                    tracing::warn!(
                        chosen = %decision.next_scene_id,
                        fallback = %pre_selected,
                        "Advisory chose an unknown scene, using mapped branch"
                    );
                    Ok(SceneDecision::linear(pre_selected))
                }
            }
            Err(e) => {
                tracing::error!(error = %e, fallback = %pre_selected, "Advisory call failed, using mapped branch");
                Ok(SceneDecision::linear(pre_selected))
            }
        }
    }

    async fn advise(
        &self,
        summary: &EmotionSummary,
        state: &SessionState,
        branches: &std::collections::HashMap<String, String>,
        pre_selected: &str,
    ) -> Result<SceneDecision, LlmError> {
        let summary_json = serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string());
        let branches_json = serde_json::to_string(branches).unwrap_or_else(|_| "{}".to_string());
        let played = if state.scenes_played.is_empty() {
            "just started".to_string()
        } else {
            state.scenes_played.join(", ")
        };

        let prompt = format!(
            "You are the director of an adaptive {genre} film, making a narrative \
             decision based on the viewer's emotional state.\n\n\
             Story so far: {played}\n\
             Current viewer state: {summary_json}\n\
             Available branches: {branches_json}\n\
             Emotion-mapped branch: {pre_selected}\n\n\
             Confirm or override the branch selection. Return ONLY JSON:\n\
             {{\"next_scene_id\": \"the scene id you choose\", \
             \"mood_shift\": \"tense\" or \"warm\" or \"mysterious\" or null, \
             \"pacing\": \"slow\" or \"medium\" or \"fast\", \
             \"reasoning\": \"One sentence explaining your choice\"}}",
            genre = state.genre,
        );

        let response = self
            .llm
            .generate(LlmRequest::new(prompt).with_temperature(DECIDE_TEMPERATURE))
            .await?;

        let wire: WireAdvice = serde_json::from_str(strip_json_fences(&response.content))
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(SceneDecision {
            next_scene_id: wire.next_scene_id,
            override_narration: None,
            mood_shift: wire.mood_shift,
            pacing: wire.pacing.unwrap_or_default(),
            reasoning: wire.reasoning.unwrap_or_default(),
        })
    }
}

/// Strict decode shape for the advisory response; a missing `next_scene_id`
/// is a decode failure, not a half-trusted decision.
#[derive(Debug, Deserialize)]
struct WireAdvice {
    next_scene_id: String,
    #[serde(default)]
    mood_shift: Option<String>,
    #[serde(default)]
    pacing: Option<Pacing>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmResponse, MockLlmPort};
    use reelwright_domain::Emotion;

    fn graph() -> StoryGraph {
        let source = serde_json::json!({
            "scenes": {
                "opening": { "id": "opening", "next": "foyer" },
                "foyer": { "id": "foyer", "next": "crossroads" },
                "crossroads": {
                    "id": "crossroads",
                    "is_decision_point": true,
                    "branches": {
                        "engaged": "upstairs_door",
                        "bored": "cellar",
                        "default": "study"
                    }
                },
                "upstairs_door": { "id": "upstairs_door", "next": null },
                "cellar": { "id": "cellar", "next": null },
                "study": { "id": "study", "next": null },
                "ending": { "id": "ending", "next": null }
            }
        })
        .to_string();
        StoryGraph::load(&source).unwrap()
    }

    fn summary(dominant: Emotion) -> EmotionSummary {
        EmotionSummary {
            dominant_emotion: dominant,
            ..EmotionSummary::neutral()
        }
    }

    fn state_at(scene_id: &str) -> SessionState {
        SessionState {
            current_scene_id: scene_id.to_string(),
            scenes_played: vec!["opening".to_string()],
            chapter: String::new(),
            genre: "mystery".to_string(),
        }
    }

    #[tokio::test]
    async fn linear_successor_makes_no_advisory_call() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().times(0);
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Engaged), &state_at("opening"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "foyer");
    }

    #[tokio::test]
    async fn terminal_scene_stays_put() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().times(0);
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Neutral), &state_at("ending"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "ending");
    }

    #[tokio::test]
    async fn advisory_failure_uses_emotion_mapped_branch() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("timeout".into())));
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Engaged), &state_at("foyer"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "upstairs_door");
    }

    #[tokio::test]
    async fn unmapped_emotion_falls_back_to_default_entry() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("timeout".into())));
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Confused), &state_at("foyer"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "study");
    }

    #[tokio::test]
    async fn advisory_override_is_honored_when_valid() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().times(1).returning(|_| {
            Ok(LlmResponse {
                content: r#"{"next_scene_id": "cellar", "mood_shift": "tense", "pacing": "fast", "reasoning": "Shake the viewer awake."}"#
                    .to_string(),
            })
        });
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Engaged), &state_at("foyer"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "cellar");
        assert_eq!(decision.mood_shift.as_deref(), Some("tense"));
        assert_eq!(decision.pacing, Pacing::Fast);
    }

    #[tokio::test]
    async fn advisory_with_unknown_scene_is_replaced_by_fallback() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().times(1).returning(|_| {
            Ok(LlmResponse {
                content: r#"{"next_scene_id": "the_moon"}"#.to_string(),
            })
        });
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Engaged), &state_at("foyer"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "upstairs_door");
    }

    #[tokio::test]
    async fn malformed_advisory_json_is_a_decode_failure() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().times(1).returning(|_| {
            Ok(LlmResponse {
                content: "I'd pick the cellar, probably.".to_string(),
            })
        });
        let director = Director::new(Arc::new(llm));

        let decision = director
            .decide(&summary(Emotion::Bored), &state_at("foyer"), &graph())
            .await
            .unwrap();
        assert_eq!(decision.next_scene_id, "cellar");
    }

    #[tokio::test]
    async fn unknown_current_scene_surfaces_story_error() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().times(0);
        let director = Director::new(Arc::new(llm));

        let err = director
            .decide(&summary(Emotion::Neutral), &state_at("attic"), &graph())
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::SceneNotFound { .. }));
    }
}
