//! Media generation backend client.
//!
//! Talks to a job-queue generation server: stills and speech come back
//! directly, video is submitted as a job and polled by the asset pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::ports::{MediaGenError, MediaGenPort, VideoJobStatus};

/// Default media backend base URL.
pub const DEFAULT_MEDIA_BASE_URL: &str = "http://localhost:8188";

/// Client for the media generation server.
#[derive(Clone)]
pub struct MediaClient {
    client: Client,
    base_url: String,
}

impl MediaClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for generation
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create client from `MEDIA_BASE_URL`, falling back to the default.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MEDIA_BASE_URL").unwrap_or_else(|_| DEFAULT_MEDIA_BASE_URL.to_string());
        Self::new(&base_url)
    }

    async fn post_for_bytes(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Vec<u8>, MediaGenError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MediaGenError::GenerationFailed(error_text));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))
    }

    async fn fetch_video_payload(&self, job_id: &str) -> Result<Vec<u8>, MediaGenError> {
        let response = self
            .client
            .get(format!("{}/v1/video/jobs/{}/payload", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MediaGenError::GenerationFailed(error_text));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))
    }
}

#[async_trait]
impl MediaGenPort for MediaClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, MediaGenError> {
        self.post_for_bytes("/v1/images", &PromptRequest { prompt })
            .await
    }

    async fn generate_speech(&self, text: &str) -> Result<Vec<u8>, MediaGenError> {
        self.post_for_bytes("/v1/speech", &SpeechRequest { text })
            .await
    }

    async fn submit_video(&self, prompt: &str) -> Result<String, MediaGenError> {
        let response = self
            .client
            .post(format!("{}/v1/video/jobs", self.base_url))
            .json(&PromptRequest { prompt })
            .send()
            .await
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MediaGenError::GenerationFailed(error_text));
        }

        let submitted: JobSubmitted = response
            .json()
            .await
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))?;
        Ok(submitted.job_id)
    }

    async fn poll_video(&self, job_id: &str) -> Result<VideoJobStatus, MediaGenError> {
        let response = self
            .client
            .get(format!("{}/v1/video/jobs/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MediaGenError::GenerationFailed(error_text));
        }

        let status: JobState = response
            .json()
            .await
            .map_err(|e| MediaGenError::GenerationFailed(e.to_string()))?;

        match status.status.as_str() {
            "complete" => {
                let payload = self.fetch_video_payload(job_id).await?;
                Ok(VideoJobStatus::Complete(payload))
            }
            "failed" => Ok(VideoJobStatus::Failed(
                status.error.unwrap_or_else(|| "unknown".to_string()),
            )),
            _ => Ok(VideoJobStatus::Pending),
        }
    }
}

// =============================================================================
// Media server API types
// =============================================================================

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct JobSubmitted {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobState {
    status: String,
    #[serde(default)]
    error: Option<String>,
}
