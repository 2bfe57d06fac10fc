//! Lyrics lookup and timed-lyrics parsing
//!
//! This module provides:
//! - LRCLIB and lyrics.ovh API clients
//! - the provider chain that tries each source in order
//! - LRC format parser for synchronized lyrics

pub mod lrclib;
pub mod ovh;
pub mod parser;
pub mod provider;
pub mod resolver;

pub use lrclib::LrclibClient;
pub use ovh::LyricsOvhClient;
pub use parser::{ParsedLyricLine, ParsedTimeline};
pub use provider::{LyricsProvider, ProviderLyrics};
pub use resolver::LyricsResolver;

/// What the caller knows about the song being played.
///
/// Title and artist are expected to be cleaned already (see
/// [`crate::track::clean_title`]); nothing downstream strips suffixes again.
#[derive(Debug, Clone, PartialEq)]
pub struct SongQuery {
    pub title: String,
    /// May be empty when the artist couldn't be detected.
    pub artist: String,
    pub duration_secs: Option<f64>,
}

impl SongQuery {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration_secs: Option<f64>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration_secs: duration_secs.filter(|d| d.is_finite() && *d >= 0.0),
        }
    }

    pub fn has_artist(&self) -> bool {
        !self.artist.trim().is_empty()
    }

    /// Duration rounded to whole seconds, as the lookup endpoints expect it.
    pub fn rounded_duration(&self) -> Option<u64> {
        self.duration_secs.map(|d| d.round() as u64)
    }
}

/// Lyrics produced by a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsResult {
    /// Display text: header, lyrics, source credit. Never empty.
    pub plain_text: String,
    /// Raw LRC block, only when the answering provider had timed lyrics.
    pub synced_text: Option<String>,
    pub source_label: String,
}

impl LyricsResult {
    pub fn timeline(&self) -> Option<ParsedTimeline> {
        self.synced_text.as_deref().map(ParsedTimeline::parse)
    }
}

/// Wrap provider text with the title header and source credit.
pub fn format_lyrics(query: &SongQuery, lyrics: &str, source_label: &str) -> String {
    let artist = if query.has_artist() {
        format!(" - {}", query.artist)
    } else {
        String::new()
    };
    format!(
        "🎵 {}{}\n\n{}\n\n— Source: {}",
        query.title,
        artist,
        lyrics.trim(),
        source_label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_artist() {
        let q = SongQuery::new("Test Song", "Test Artist", None);
        let out = format_lyrics(&q, "  Lyrics here\n", "LRCLIB");
        assert_eq!(out, "🎵 Test Song - Test Artist\n\nLyrics here\n\n— Source: LRCLIB");
    }

    #[test]
    fn test_format_without_artist() {
        let q = SongQuery::new("Test Song", "", None);
        let out = format_lyrics(&q, "Lyrics here", "Lyrics API");
        assert!(out.starts_with("🎵 Test Song\n\n"));
        assert!(!out.contains(" - "));
        assert!(out.ends_with("Source: Lyrics API"));
    }

    #[test]
    fn test_query_drops_invalid_duration() {
        assert_eq!(SongQuery::new("a", "b", Some(-1.0)).duration_secs, None);
        assert_eq!(SongQuery::new("a", "b", Some(f64::NAN)).duration_secs, None);
        assert_eq!(SongQuery::new("a", "b", Some(239.6)).rounded_duration(), Some(240));
    }
}
