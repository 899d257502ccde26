//! Environment-driven engine configuration.

use std::time::Duration;

/// All tunables, read once at startup. Defaults suit local development;
/// video generation stays off unless explicitly enabled so dev runs never
/// burn generation credits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub story_path: String,
    pub cors_allowed_origins: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub media_base_url: String,
    pub video_enabled: bool,
    pub video_poll_interval: Duration,
    pub video_timeout: Duration,
    /// Seconds of scene playback represented by one perception sample.
    pub seconds_per_sample: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            story_path: "story.json".to_string(),
            cors_allowed_origins: "http://localhost:3000,http://localhost:5173".to_string(),
            llm_base_url: "http://localhost:11434".to_string(),
            llm_model: "llama3.2".to_string(),
            media_base_url: "http://localhost:8188".to_string(),
            video_enabled: false,
            video_poll_interval: Duration::from_secs(8),
            video_timeout: Duration::from_secs(90),
            seconds_per_sample: 15,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_host: env_or("SERVER_HOST", defaults.server_host),
            server_port: env_parse("SERVER_PORT", defaults.server_port),
            story_path: env_or("STORY_PATH", defaults.story_path),
            cors_allowed_origins: env_or("CORS_ALLOWED_ORIGINS", defaults.cors_allowed_origins),
            llm_base_url: env_or("OLLAMA_BASE_URL", defaults.llm_base_url),
            llm_model: env_or("OLLAMA_MODEL", defaults.llm_model),
            media_base_url: env_or("MEDIA_BASE_URL", defaults.media_base_url),
            video_enabled: env_or("VIDEO_ENABLED", String::new()).eq_ignore_ascii_case("true"),
            video_poll_interval: Duration::from_secs(env_parse(
                "VIDEO_POLL_INTERVAL_SECS",
                defaults.video_poll_interval.as_secs(),
            )),
            video_timeout: Duration::from_secs(env_parse(
                "VIDEO_TIMEOUT_SECS",
                defaults.video_timeout.as_secs(),
            )),
            seconds_per_sample: env_parse("SECONDS_PER_SAMPLE", defaults.seconds_per_sample).max(1),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
