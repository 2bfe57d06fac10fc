//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics
//! and accepts community contributions gated by a proof-of-work challenge.
//! API Documentation: https://lrclib.net/docs

use crate::error::LyricsError;
use crate::publish::{Challenge, CommunityService, PublishToken, TrackContribution};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// LRCLIB track record, as returned by `/get` and `/search`
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LrclibTrack {
    #[allow(dead_code)]
    pub id: Option<i64>,
    #[allow(dead_code)]
    pub track_name: Option<String>,
    #[allow(dead_code)]
    pub artist_name: Option<String>,
    pub plain_lyrics: Option<String>,
    pub synced_lyrics: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = "lyricsio/0.1.0 (https://github.com/lyricsio/lyricsio)";
    const PUBLISH_TOKEN_HEADER: &'static str = "X-Publish-Token";

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn exact_url(&self, track_name: &str, artist_name: &str, album_name: &str, duration_secs: u64) -> String {
        format!(
            "{}/get?track_name={}&artist_name={}&album_name={}&duration={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name),
            urlencoding::encode(album_name),
            duration_secs
        )
    }

    fn search_url(&self, track_name: &str, artist_name: &str) -> String {
        format!(
            "{}/search?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        )
    }

    /// Get lyrics with exact match. `Ok(None)` means LRCLIB has no such track.
    pub async fn get_exact(
        &self,
        track_name: &str,
        artist_name: &str,
        album_name: &str,
        duration_secs: u64,
    ) -> anyhow::Result<Option<LrclibTrack>> {
        let url = self.exact_url(track_name, artist_name, album_name, duration_secs);
        let response = self.client.get(&url).send().await.context("send LRCLIB get request")?;

        if response.status().is_success() {
            let track: LrclibTrack = response.json().await.context("parse LRCLIB get json")?;
            Ok(Some(track))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }

    /// Search for lyrics. Results come back in LRCLIB's ranking order.
    pub async fn search(&self, track_name: &str, artist_name: &str) -> anyhow::Result<Vec<LrclibTrack>> {
        let url = self.search_url(track_name, artist_name);
        let response = self.client.get(&url).send().await.context("send LRCLIB search request")?;

        if response.status().is_success() {
            let results: Vec<LrclibTrack> = response.json().await.context("parse LRCLIB search json")?;
            Ok(results)
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(Vec::new())
        } else {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }
    }

    pub async fn request_challenge(&self) -> anyhow::Result<Challenge> {
        let url = format!("{}/request-challenge", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to reach LRCLIB")?;

        if !response.status().is_success() {
            anyhow::bail!("{}", remote_message(response, "Failed to get publish challenge").await);
        }
        response.json().await.context("Malformed publish challenge")
    }

    pub async fn publish(&self, contribution: &TrackContribution, token: &PublishToken) -> anyhow::Result<()> {
        let url = format!("{}/publish", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(Self::PUBLISH_TOKEN_HEADER, token.as_str())
            .json(contribution)
            .send()
            .await
            .context("Failed to reach LRCLIB")?;

        if !response.status().is_success() {
            anyhow::bail!("{}", remote_message(response, "Failed to publish").await);
        }
        Ok(())
    }
}

/// Use the server's `message` field when it sent one, otherwise a generic
/// message with the status code.
async fn remote_message(response: reqwest::Response, fallback: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    message_from_body(&body).unwrap_or_else(|| format!("{fallback} (HTTP {})", status.as_u16()))
}

fn message_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

#[async_trait]
impl CommunityService for LrclibClient {
    async fn request_challenge(&self) -> Result<Challenge, LyricsError> {
        LrclibClient::request_challenge(self)
            .await
            .map_err(|e| LyricsError::Publish(e.to_string()))
    }

    async fn submit(&self, contribution: &TrackContribution, token: &PublishToken) -> Result<(), LyricsError> {
        self.publish(contribution, token)
            .await
            .map_err(|e| LyricsError::Publish(e.to_string()))
    }
}
