//! lyrics.ovh API client
//!
//! Plain-text lyrics only, looked up by artist and title path segments.

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct OvhResponse {
    #[serde(default)]
    lyrics: String,
}

#[derive(Debug, Clone)]
pub struct LyricsOvhClient {
    client: reqwest::Client,
    base_url: String,
}

impl LyricsOvhClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.lyrics.ovh";

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn lyrics_url(&self, artist: &str, title: &str) -> String {
        format!(
            "{}/v1/{}/{}",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        )
    }

    /// Fetch plain lyrics. Any non-success status is reported as an error.
    pub async fn get_lyrics(&self, artist: &str, title: &str) -> anyhow::Result<String> {
        let url = self.lyrics_url(artist, title);
        let response = self.client.get(&url).send().await.context("send lyrics.ovh request")?;

        if !response.status().is_success() {
            anyhow::bail!("Song not found ({})", response.status());
        }

        let data: OvhResponse = response.json().await.context("parse lyrics.ovh json")?;
        Ok(data.lyrics)
    }
}
