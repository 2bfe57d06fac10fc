//! Generative text and speech-to-text client (Groq, OpenAI-compatible API)
//!
//! Used as an opaque external function: chat completions for the lyrics
//! fallback and chord sheets, and Whisper transcription for lyrics generated
//! from recorded audio.

pub mod transcript;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use transcript::{Segment, Transcription};

/// The phrase the model is told to answer with when it isn't sure.
///
/// Completions that consist of this phrase are still returned as lyrics; callers
/// that care can compare against it.
pub const NOT_FOUND_PHRASE: &str =
    "I couldn't find verified lyrics for this song. Please try searching on a lyrics website.";

const LYRICS_SYSTEM: &str = "You are a lyrics expert. Only provide lyrics you are absolutely certain about. \
Never make up or guess lyrics. If unsure, say so.";

const CHORDS_SYSTEM: &str = "You are a guitar teacher who writes chord sheets. \
Place chord names on their own line directly above the lyric line where the change happens. \
Use standard chord names (C, G, Am, F#m7, ...). Do not add commentary.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    chat_model: String,
    transcription_model: String,
}

impl GroqClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1";
    pub const DEFAULT_CHAT_MODEL: &'static str = "llama-3.3-70b-versatile";
    pub const DEFAULT_TRANSCRIPTION_MODEL: &'static str = "whisper-large-v3";

    pub fn new(
        base_url: &str,
        api_key: &str,
        chat_model: &str,
        transcription_model: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut authz = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .context("API key contains invalid header characters")?;
        authz.set_sensitive(true);
        headers.insert(AUTHORIZATION, authz);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model: chat_model.to_string(),
            transcription_model: transcription_model.to_string(),
        })
    }

    /// Single-turn chat completion. Returns the raw completion text, which may be empty.
    pub async fn complete(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: 2000,
            temperature: 0.1,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .context("send chat completion request")?;

        if !response.status().is_success() {
            anyhow::bail!("{}", api_error(response, "AI request failed").await);
        }

        let data: ChatResponse = response.json().await.context("parse chat completion json")?;
        Ok(data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Ask the model for lyrics of a song. See [`NOT_FOUND_PHRASE`].
    pub async fn lyrics(&self, title: &str, artist: &str) -> anyhow::Result<String> {
        self.complete(LYRICS_SYSTEM, &lyrics_prompt(title, artist)).await
    }

    /// Chord sheet for the given lyrics, chords placed above lyric lines.
    pub async fn generate_chords(&self, title: &str, artist: &str, lyrics: &str) -> anyhow::Result<String> {
        self.complete(CHORDS_SYSTEM, &chords_prompt(title, artist, lyrics)).await
    }

    /// Transcribe an audio file with timestamps per segment.
    pub async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> anyhow::Result<Transcription> {
        let part = reqwest::multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .text("response_format", "verbose_json")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("send transcription request")?;

        if !response.status().is_success() {
            anyhow::bail!("{}", api_error(response, "Transcription failed").await);
        }

        response.json().await.context("parse transcription json")
    }
}

async fn api_error(response: reqwest::Response, fallback: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("{fallback} (HTTP {})", status.as_u16()))
}

fn by_artist(artist: &str) -> String {
    if artist.trim().is_empty() {
        String::new()
    } else {
        format!(" by {artist}")
    }
}

pub fn lyrics_prompt(title: &str, artist: &str) -> String {
    format!(
        r#"I need the EXACT lyrics for the song "{title}"{by}.

IMPORTANT: Only provide lyrics if you are CERTAIN they are correct. Do not guess or make up lyrics.

If you know the exact lyrics, format them like this:
[Verse 1]
(lyrics...)

[Chorus]
(lyrics...)

(continue with proper section markers...)

If you are not sure about the exact lyrics, respond with:
"{NOT_FOUND_PHRASE}""#,
        by = by_artist(artist),
    )
}

fn chords_prompt(title: &str, artist: &str, lyrics: &str) -> String {
    format!(
        "Write a guitar chord sheet for \"{title}\"{by}. Keep every lyric line below, in order.\n\n{lyrics}",
        by = by_artist(artist),
        lyrics = lyrics.trim(),
    )
}
