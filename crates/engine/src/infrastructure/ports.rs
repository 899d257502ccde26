//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - LLM calls (could swap Ollama -> another chat backend)
//! - Media generation (could swap the generation server)
//!
//! Every caller of these ports degrades failures to a safe default; port
//! errors never reach a viewer.

use async_trait::async_trait;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MediaGenError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Service unavailable")]
    Unavailable,
}

// =============================================================================
// LLM Port
// =============================================================================

/// A single chat-style completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    /// Optional images for multimodal models.
    pub images: Vec<ImageData>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            temperature: None,
            images: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_image(mut self, data: impl Into<String>, media_type: impl Into<String>) -> Self {
        self.images.push(ImageData {
            data: data.into(),
            media_type: media_type.into(),
        });
        self
    }
}

/// Base64-encoded image attached to a request.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: String,
    pub media_type: String,
}

/// The generated completion.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

// =============================================================================
// Media Generation Port
// =============================================================================

/// State of a long-running video generation job.
#[derive(Debug, Clone)]
pub enum VideoJobStatus {
    Pending,
    Complete(Vec<u8>),
    Failed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaGenPort: Send + Sync {
    /// Render a still image for a visual prompt.
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, MediaGenError>;

    /// Synthesize narration speech. Returns raw L16 PCM at 24 kHz mono.
    async fn generate_speech(&self, text: &str) -> Result<Vec<u8>, MediaGenError>;

    /// Submit a video generation job; returns the job id to poll.
    async fn submit_video(&self, prompt: &str) -> Result<String, MediaGenError>;

    /// Check on a submitted job, fetching the payload once complete.
    async fn poll_video(&self, job_id: &str) -> Result<VideoJobStatus, MediaGenError>;
}
