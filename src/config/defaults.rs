use super::{Config, GeneralConfig, PathsConfig, ProvidersConfig, PublishConfig, SyncConfig, Theme};
use crate::ai::GroqClient;
use crate::lyrics::{LrclibClient, LyricsOvhClient};
use crate::pow;

pub const LRCLIB_URL: &str = LrclibClient::DEFAULT_BASE_URL;
pub const LYRICS_OVH_URL: &str = LyricsOvhClient::DEFAULT_BASE_URL;
pub const GROQ_URL: &str = GroqClient::DEFAULT_BASE_URL;
pub const TIMEOUT_SECS: u64 = 10;
pub const MAX_POW_ATTEMPTS: u64 = pow::DEFAULT_MAX_ATTEMPTS;
pub const POLL_INTERVAL_MS: u64 = 100;

pub fn defaults() -> Config {
    Config::default()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            theme: Theme::Dark,
            auto_detect: true,
            show_panel: true,
            show_overlay: true,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            lrclib_url: LRCLIB_URL.to_string(),
            lyrics_ovh_url: LYRICS_OVH_URL.to_string(),
            groq_url: GROQ_URL.to_string(),
            api_key: None,
            chat_model: GroqClient::DEFAULT_CHAT_MODEL.to_string(),
            transcription_model: GroqClient::DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            timeout_secs: TIMEOUT_SECS,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_POW_ATTEMPTS,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = super::project_dirs()
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("lyricsio"));
        Self { data_dir }
    }
}
