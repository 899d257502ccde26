//! Webcam frame classification into emotion readings.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use reelwright_domain::{Attention, Emotion, EmotionReading};

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest};
use crate::use_cases::strip_json_fences;

const CLASSIFY_TEMPERATURE: f32 = 0.3;

const CLASSIFY_PROMPT: &str = r#"Analyze this webcam image of a person watching a film.
Return ONLY a JSON object with these exact fields:
{
  "primary_emotion": one of "engaged","bored","confused","amused","tense","surprised","neutral",
  "intensity": integer 1-10,
  "attention": one of "screen","away","uncertain",
  "confidence": float 0.0-1.0
}
No other text. Only the JSON object."#;

/// Classifies raw frames via the multimodal LLM.
///
/// Classification never fails from the caller's point of view: any
/// transport or decode problem produces the neutral fallback reading.
pub struct EmotionClassifier {
    llm: Arc<dyn LlmPort>,
}

impl EmotionClassifier {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    pub async fn classify_frame(&self, frame_base64: &str) -> EmotionReading {
        match self.try_classify(frame_base64).await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::error!(error = %e, "Frame classification failed, using neutral fallback");
                EmotionReading::neutral()
            }
        }
    }

    async fn try_classify(&self, frame_base64: &str) -> Result<EmotionReading, LlmError> {
        let request = LlmRequest::new(CLASSIFY_PROMPT)
            .with_temperature(CLASSIFY_TEMPERATURE)
            .with_image(frame_base64, "image/jpeg");
        let response = self.llm.generate(request).await?;
        decode_reading(&response.content)
    }
}

/// Strict all-or-nothing decode of the classifier response.
fn decode_reading(content: &str) -> Result<EmotionReading, LlmError> {
    let wire: WireReading = serde_json::from_str(strip_json_fences(content))
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    let reading = EmotionReading {
        primary_emotion: wire.primary_emotion,
        intensity: wire.intensity,
        attention: wire.attention,
        confidence: wire.confidence,
        timestamp: Utc::now(),
    };
    if !reading.is_valid() {
        return Err(LlmError::InvalidResponse(format!(
            "reading out of range: intensity={} confidence={}",
            reading.intensity, reading.confidence
        )));
    }
    Ok(reading)
}

#[derive(Debug, Deserialize)]
struct WireReading {
    primary_emotion: Emotion,
    intensity: u8,
    attention: Attention,
    confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmResponse, MockLlmPort};

    fn classifier_returning(content: &str) -> EmotionClassifier {
        let mut llm = MockLlmPort::new();
        let content = content.to_string();
        llm.expect_generate()
            .times(1)
            .returning(move |_| Ok(LlmResponse {
                content: content.clone(),
            }));
        EmotionClassifier::new(Arc::new(llm))
    }

    #[tokio::test]
    async fn decodes_plain_json_response() {
        let classifier = classifier_returning(
            r#"{"primary_emotion": "amused", "intensity": 6, "attention": "screen", "confidence": 0.7}"#,
        );
        let reading = classifier.classify_frame("ZnJhbWU=").await;
        assert_eq!(reading.primary_emotion, Emotion::Amused);
        assert_eq!(reading.intensity, 6);
        assert_eq!(reading.attention, Attention::Screen);
    }

    #[tokio::test]
    async fn decodes_fenced_json_response() {
        let classifier = classifier_returning(
            "```json\n{\"primary_emotion\": \"tense\", \"intensity\": 9, \"attention\": \"screen\", \"confidence\": 0.9}\n```",
        );
        let reading = classifier.classify_frame("ZnJhbWU=").await;
        assert_eq!(reading.primary_emotion, Emotion::Tense);
    }

    #[tokio::test]
    async fn falls_back_to_neutral_on_garbage() {
        let classifier = classifier_returning("I see a person who looks happy!");
        let reading = classifier.classify_frame("ZnJhbWU=").await;
        assert_eq!(reading, EmotionReading { timestamp: reading.timestamp, ..EmotionReading::neutral() });
    }

    #[tokio::test]
    async fn falls_back_to_neutral_on_out_of_range_intensity() {
        let classifier = classifier_returning(
            r#"{"primary_emotion": "engaged", "intensity": 14, "attention": "screen", "confidence": 0.9}"#,
        );
        let reading = classifier.classify_frame("ZnJhbWU=").await;
        assert_eq!(reading.primary_emotion, Emotion::Neutral);
        assert_eq!(reading.intensity, 5);
    }

    #[tokio::test]
    async fn falls_back_to_neutral_on_transport_failure() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("connection refused".into())));
        let classifier = EmotionClassifier::new(Arc::new(llm));

        let reading = classifier.classify_frame("ZnJhbWU=").await;
        assert_eq!(reading.primary_emotion, Emotion::Neutral);
        assert_eq!(reading.attention, Attention::Uncertain);
        assert_eq!(reading.confidence, 0.0);
    }

    #[tokio::test]
    async fn rejects_unknown_emotion_variant() {
        let classifier = classifier_returning(
            r#"{"primary_emotion": "ecstatic", "intensity": 5, "attention": "screen", "confidence": 0.5}"#,
        );
        let reading = classifier.classify_frame("ZnJhbWU=").await;
        assert_eq!(reading.primary_emotion, Emotion::Neutral);
    }
}
