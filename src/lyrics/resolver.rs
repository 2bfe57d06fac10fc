//! Ordered provider chain with a terminal fallback.

use super::lrclib::LrclibClient;
use super::ovh::LyricsOvhClient;
use super::provider::{AiProvider, ExactMatchProvider, LyricsProvider, PlainApiProvider, SearchProvider};
use super::{format_lyrics, LyricsResult, SongQuery};
use crate::ai::GroqClient;
use crate::config::ProvidersConfig;
use crate::error::{LyricsError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Tries providers in order and stops at the first one with lyrics.
///
/// Failures of the ordinary providers are logged and skipped. The fallback,
/// when configured, is the last word: its errors are returned to the caller.
#[derive(Clone)]
pub struct LyricsResolver {
    providers: Vec<Arc<dyn LyricsProvider>>,
    fallback: Option<Arc<dyn LyricsProvider>>,
}

impl LyricsResolver {
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>, fallback: Option<Arc<dyn LyricsProvider>>) -> Self {
        Self { providers, fallback }
    }

    /// LRCLIB exact match, LRCLIB search, lyrics.ovh, then AI when an API key is set.
    pub fn from_config(cfg: &ProvidersConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let lrclib = LrclibClient::new(&cfg.lrclib_url, timeout)?;
        let ovh = LyricsOvhClient::new(&cfg.lyrics_ovh_url, timeout)?;

        let providers: Vec<Arc<dyn LyricsProvider>> = vec![
            Arc::new(ExactMatchProvider::new(lrclib.clone())),
            Arc::new(SearchProvider::new(lrclib)),
            Arc::new(PlainApiProvider::new(ovh)),
        ];

        let fallback = match cfg.api_key() {
            Some(key) => {
                let groq = GroqClient::new(
                    &cfg.groq_url,
                    key,
                    &cfg.chat_model,
                    &cfg.transcription_model,
                    timeout,
                )?;
                Some(Arc::new(AiProvider::new(groq)) as Arc<dyn LyricsProvider>)
            }
            None => None,
        };

        Ok(Self::new(providers, fallback))
    }

    pub async fn resolve(&self, query: &SongQuery) -> Result<LyricsResult> {
        tracing::info!(title = %query.title, artist = %query.artist, "searching lyrics");

        for provider in &self.providers {
            let label = provider.label();
            if !provider.applies_to(query) {
                tracing::debug!(provider = label, "skipped");
                continue;
            }

            match provider.try_resolve(query).await {
                Ok(Some(lyrics)) if lyrics.is_usable() => {
                    tracing::info!(provider = label, synced = lyrics.synced.is_some(), "lyrics found");
                    return Ok(LyricsResult {
                        plain_text: format_lyrics(query, &lyrics.plain, label),
                        synced_text: lyrics.synced,
                        source_label: label.to_string(),
                    });
                }
                Ok(_) => tracing::debug!(provider = label, "no lyrics, trying next source"),
                Err(e) => tracing::warn!(provider = label, "failed, trying next source: {e:#}"),
            }
        }

        let Some(fallback) = &self.fallback else {
            return Err(LyricsError::NotFound);
        };

        let label = fallback.label();
        match fallback.try_resolve(query).await {
            Ok(Some(lyrics)) if lyrics.is_usable() => {
                tracing::info!(provider = label, "lyrics generated");
                Ok(LyricsResult {
                    plain_text: format_lyrics(query, &lyrics.plain, label),
                    synced_text: lyrics.synced,
                    source_label: label.to_string(),
                })
            }
            Ok(_) => Err(LyricsError::NotFound),
            Err(e) => Err(LyricsError::Remote {
                provider: label.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
