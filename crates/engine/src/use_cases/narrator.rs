//! Viewer-personalized narration rewriting.
//!
//! Pure graceful degradation: the caller always receives usable text. An
//! empty seed short-circuits without calling out, and any failure returns
//! the original scripted line.

use std::sync::Arc;

use reelwright_domain::{EmotionSummary, Pacing};

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest};

const ADAPT_TEMPERATURE: f32 = 0.8;

pub struct Narrator {
    llm: Arc<dyn LlmPort>,
}

impl Narrator {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn adapt_narration(
        &self,
        seed: &str,
        mood: Option<&str>,
        pacing: Pacing,
        summary: &EmotionSummary,
        scenes_played: &[String],
        genre: &str,
    ) -> String {
        if seed.trim().is_empty() {
            return seed.to_string();
        }

        match self
            .try_adapt(seed, mood, pacing, summary, scenes_played, genre)
            .await
        {
            Ok(adapted) if !adapted.is_empty() => adapted,
            Ok(_) => seed.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Narration rewrite failed, keeping scripted line");
                seed.to_string()
            }
        }
    }

    async fn try_adapt(
        &self,
        seed: &str,
        mood: Option<&str>,
        pacing: Pacing,
        summary: &EmotionSummary,
        scenes_played: &[String],
        genre: &str,
    ) -> Result<String, LlmError> {
        let prompt = format!(
            "You are the narrator of an adaptive {genre} film.\n\
             Rewrite this narration line to match a specific viewer's emotional state right now.\n\n\
             Original narration: \"{seed}\"\n\
             Viewer: {emotion} emotion, intensity {intensity:.1}/10, trend: {trend}\n\
             Director's intent: mood={mood}, pacing={pacing}\n\
             Scene number: {scene_number}\n\n\
             Adaptation rules - apply the one that matches the viewer:\n\
             - BORED or falling intensity: urgency, shorter sentences, active verbs\n\
             - TENSE or rising intensity: one small breath of relief, then push forward\n\
             - CONFUSED: add a single grounding phrase, slow the rhythm\n\
             - ENGAGED or AMUSED: deepen the atmosphere, trust the viewer\n\
             - All other states: serve the director's mood and pacing intent\n\n\
             Return ONLY the adapted narration text (1-3 sentences).\n\
             No quotes. No labels. No explanation. Just the narration.",
            emotion = summary.dominant_emotion.as_str(),
            intensity = summary.intensity_avg,
            trend = summary.trend.as_str(),
            mood = mood.unwrap_or("neutral"),
            pacing = pacing.as_str(),
            scene_number = scenes_played.len() + 1,
        );

        let response = self
            .llm
            .generate(LlmRequest::new(prompt).with_temperature(ADAPT_TEMPERATURE))
            .await?;

        Ok(response
            .content
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .trim()
            .to_string())
    }
}
