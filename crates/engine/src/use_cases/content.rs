//! The asset pipeline: memoized, fault-isolated scene generation.
//!
//! On a cache miss the video attempt and the narration speech run
//! concurrently; a missing video falls back to a still image afterwards.
//! Each generation is independently degraded to an absent field on failure,
//! so a scene response always comes back, even if empty.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use reelwright_domain::{AssetKey, SceneAssets, SceneDecision, SceneNode, StoryGraph};

use crate::config::EngineConfig;
use crate::infrastructure::cache::AssetCache;
use crate::infrastructure::ports::{MediaGenError, MediaGenPort, VideoJobStatus};

/// Sample rate of the PCM speech the media backend returns.
const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Video generation settings for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub video_enabled: bool,
    pub video_poll_interval: Duration,
    pub video_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            video_enabled: false,
            video_poll_interval: Duration::from_secs(8),
            video_timeout: Duration::from_secs(90),
        }
    }
}

impl From<&EngineConfig> for PipelineConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            video_enabled: config.video_enabled,
            video_poll_interval: config.video_poll_interval,
            video_timeout: config.video_timeout,
        }
    }
}

pub struct ContentPipeline {
    graph: Arc<StoryGraph>,
    media: Arc<dyn MediaGenPort>,
    cache: Arc<AssetCache>,
    config: PipelineConfig,
}

impl ContentPipeline {
    pub fn new(
        graph: Arc<StoryGraph>,
        media: Arc<dyn MediaGenPort>,
        cache: Arc<AssetCache>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            graph,
            media,
            cache,
            config,
        }
    }

    /// Generate (or fetch) the assets for one scene. Infallible: every
    /// backend failure degrades to an absent field.
    pub async fn generate(
        &self,
        decision: &SceneDecision,
        scene: &SceneNode,
        genre: &str,
    ) -> Arc<SceneAssets> {
        let key = AssetKey::for_scene(&scene.id, genre, decision);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(scene_id = %scene.id, "Asset cache hit");
            return hit;
        }

        let visual_prompt = build_visual_prompt(scene, genre, decision);
        let narration_text = decision
            .override_narration
            .clone()
            .unwrap_or_else(|| scene.narration.clone());

        let (video, audio) = tokio::join!(
            self.generate_video(&scene.id, &visual_prompt),
            self.generate_audio(&scene.id, &narration_text),
        );

        // Never leave a scene blank: a missing clip gets a still image.
        let image = if video.is_none() {
            self.generate_image(&scene.id, &visual_prompt).await
        } else {
            None
        };

        let assets = Arc::new(SceneAssets {
            scene_id: scene.id.clone(),
            video,
            image,
            audio,
            narration_text,
            mood: decision
                .mood_shift
                .clone()
                .unwrap_or_else(|| "neutral".to_string()),
            chapter: scene.chapter.clone(),
            duration_seconds: scene.duration_seconds,
        });

        self.cache.insert(key, Arc::clone(&assets));
        assets
    }

    /// Speculatively generate the scene after `scene`, populating the cache
    /// ahead of the real transition. Skips decision points (the branch is
    /// unknown until a real decision) and endings. Best-effort.
    pub async fn prefetch(&self, scene: &SceneNode, genre: &str) {
        let Some(next_id) = &scene.next else {
            return;
        };
        let next = match self.graph.get(next_id) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(error = %e, "Prefetch skipped");
                return;
            }
        };
        if next.is_decision_point {
            return;
        }

        let decision = SceneDecision::linear(next.id.clone());
        self.generate(&decision, next, genre).await;
        tracing::debug!(scene_id = %next.id, "Prefetched next scene");
    }

    /// Empty the asset cache so replayed sessions regenerate.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    async fn generate_video(&self, scene_id: &str, prompt: &str) -> Option<String> {
        if !self.config.video_enabled {
            return None;
        }
        match self.run_video_job(prompt).await {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) => {
                tracing::error!(
                    scene_id = %scene_id,
                    error = %e,
                    "Video generation failed, will fall back to image"
                );
                None
            }
        }
    }

    /// Submit a video job and poll it against the configured deadline.
    async fn run_video_job(&self, prompt: &str) -> Result<Vec<u8>, MediaGenError> {
        let job_id = self.media.submit_video(prompt).await?;
        let deadline = tokio::time::Instant::now() + self.config.video_timeout;

        loop {
            match self.media.poll_video(&job_id).await? {
                VideoJobStatus::Complete(bytes) => return Ok(bytes),
                VideoJobStatus::Failed(reason) => {
                    return Err(MediaGenError::GenerationFailed(reason));
                }
                VideoJobStatus::Pending => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(MediaGenError::GenerationFailed(format!(
                    "video job '{job_id}' timed out after {}s",
                    self.config.video_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.config.video_poll_interval).await;
        }
    }

    async fn generate_audio(&self, scene_id: &str, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        match self.media.generate_speech(text).await {
            // The backend returns raw L16 PCM; wrap it in a WAV container
            // the browser can decode.
            Ok(pcm) => Some(BASE64.encode(pcm_to_wav(&pcm, SPEECH_SAMPLE_RATE))),
            Err(e) => {
                tracing::error!(scene_id = %scene_id, error = %e, "Speech generation failed");
                None
            }
        }
    }

    async fn generate_image(&self, scene_id: &str, prompt: &str) -> Option<String> {
        match self.media.generate_image(prompt).await {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) => {
                tracing::error!(scene_id = %scene_id, error = %e, "Image generation failed");
                None
            }
        }
    }
}

/// Extra visual treatment per genre; the scene prompts themselves are
/// genre-neutral.
fn genre_style(genre: &str) -> Option<&'static str> {
    match genre {
        "thriller" => Some(
            "high contrast, desaturated palette, claustrophobic framing, cold institutional lighting",
        ),
        "horror" => Some(
            "deep shadows, off-kilter dutch angle, pale sickly moonlight, unsettling negative space",
        ),
        "sci-fi" => Some(
            "retrofuturism, cool neon-and-silver accents, holographic surface details, blue-white lighting",
        ),
        _ => None,
    }
}

/// Compose the final visual prompt from scene data, genre style, and mood.
fn build_visual_prompt(scene: &SceneNode, genre: &str, decision: &SceneDecision) -> String {
    let mut prompt = scene.visual_prompt.clone();
    if !genre.is_empty() {
        prompt.push_str(&format!("\nGenre treatment: {genre}"));
    }
    if let Some(style) = genre_style(genre) {
        prompt.push_str(&format!("\nAdditional visual style: {style}"));
    }
    if let Some(mood) = &decision.mood_shift {
        prompt.push_str(&format!("\nMood: {mood}"));
    }
    prompt
}

/// Wrap raw L16 PCM bytes in a WAV container (mono, 16-bit).
fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate = sample_rate * 2;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
