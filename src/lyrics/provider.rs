//! Lyrics sources behind a single capability trait.
//!
//! Each provider answers `Ok(Some(..))` with usable lyrics, `Ok(None)` when it
//! has nothing for the song, or `Err(..)` when the call itself went wrong. The
//! resolver decides what each of those means for the chain.

use super::lrclib::{LrclibClient, LrclibTrack};
use super::ovh::LyricsOvhClient;
use super::parser::ParsedTimeline;
use super::SongQuery;
use crate::ai::GroqClient;
use async_trait::async_trait;

/// Raw lyrics from one provider, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderLyrics {
    pub plain: String,
    pub synced: Option<String>,
}

impl ProviderLyrics {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain: text.into(),
            synced: None,
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.plain.trim().is_empty()
    }
}

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Credit shown under the lyrics.
    fn label(&self) -> &'static str;

    /// Whether this provider can be asked about `query` at all.
    fn applies_to(&self, _query: &SongQuery) -> bool {
        true
    }

    async fn try_resolve(&self, query: &SongQuery) -> anyhow::Result<Option<ProviderLyrics>>;
}

/// Turn an LRCLIB record into provider lyrics.
///
/// Synced lyrics are kept only when non-blank. Plain text falls back to the
/// synced lines without timestamps.
pub fn from_lrclib(track: LrclibTrack) -> Option<ProviderLyrics> {
    let synced = track.synced_lyrics.filter(|s| !s.trim().is_empty());
    let plain = track
        .plain_lyrics
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            synced.as_deref().map(|raw| {
                let text = ParsedTimeline::parse(raw).plain_text();
                if text.is_empty() { raw.trim().to_string() } else { text }
            })
        })?;
    Some(ProviderLyrics { plain, synced })
}

/// LRCLIB `/get`: title, artist and rounded duration must match.
pub struct ExactMatchProvider {
    client: LrclibClient,
}

impl ExactMatchProvider {
    pub fn new(client: LrclibClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LyricsProvider for ExactMatchProvider {
    fn label(&self) -> &'static str {
        "LRCLIB"
    }

    fn applies_to(&self, query: &SongQuery) -> bool {
        query.duration_secs.is_some()
    }

    async fn try_resolve(&self, query: &SongQuery) -> anyhow::Result<Option<ProviderLyrics>> {
        let Some(duration) = query.rounded_duration() else {
            return Ok(None);
        };
        // No album is known from a video page; LRCLIB accepts the artist in its place.
        let track = self
            .client
            .get_exact(&query.title, &query.artist, &query.artist, duration)
            .await?;
        Ok(track.and_then(from_lrclib))
    }
}

/// LRCLIB `/search`: first ranked result only.
pub struct SearchProvider {
    client: LrclibClient,
}

impl SearchProvider {
    pub fn new(client: LrclibClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LyricsProvider for SearchProvider {
    fn label(&self) -> &'static str {
        "LRCLIB Search"
    }

    async fn try_resolve(&self, query: &SongQuery) -> anyhow::Result<Option<ProviderLyrics>> {
        let results = self.client.search(&query.title, &query.artist).await?;
        Ok(results.into_iter().next().and_then(from_lrclib))
    }
}

/// lyrics.ovh: plain text, needs an artist.
pub struct PlainApiProvider {
    client: LyricsOvhClient,
}

impl PlainApiProvider {
    pub fn new(client: LyricsOvhClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LyricsProvider for PlainApiProvider {
    fn label(&self) -> &'static str {
        "Lyrics API"
    }

    fn applies_to(&self, query: &SongQuery) -> bool {
        query.has_artist()
    }

    async fn try_resolve(&self, query: &SongQuery) -> anyhow::Result<Option<ProviderLyrics>> {
        let lyrics = self.client.get_lyrics(&query.artist, &query.title).await?;
        Ok(Some(ProviderLyrics::plain(lyrics)).filter(ProviderLyrics::is_usable))
    }
}

/// Language model fallback. The completion is taken verbatim, including the
/// model's "not found" phrase.
pub struct AiProvider {
    client: GroqClient,
}

impl AiProvider {
    pub fn new(client: GroqClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LyricsProvider for AiProvider {
    fn label(&self) -> &'static str {
        "AI (verify accuracy)"
    }

    async fn try_resolve(&self, query: &SongQuery) -> anyhow::Result<Option<ProviderLyrics>> {
        let text = self.client.lyrics(&query.title, &query.artist).await?;
        Ok(Some(ProviderLyrics::plain(text)).filter(ProviderLyrics::is_usable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{route, StubServer};
    use std::time::Duration;

    fn track(json: &str) -> LrclibTrack {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_lrclib_prefers_plain() {
        let got = from_lrclib(track(
            r#"{"plainLyrics":"Line one\nLine two","syncedLyrics":"[00:01.00]Line one\n[00:05.00]Line two"}"#,
        ))
        .unwrap();
        assert_eq!(got.plain, "Line one\nLine two");
        assert_eq!(got.synced.as_deref(), Some("[00:01.00]Line one\n[00:05.00]Line two"));
    }

    #[test]
    fn test_from_lrclib_synced_only() {
        let got = from_lrclib(track(r#"{"syncedLyrics":"[00:01.00]Line one\n[00:05.00]Line two"}"#)).unwrap();
        assert_eq!(got.plain, "Line one\nLine two");
        assert!(got.synced.is_some());
    }

    #[test]
    fn test_from_lrclib_blank_synced_is_dropped() {
        let got = from_lrclib(track(r#"{"plainLyrics":"words","syncedLyrics":"  "}"#)).unwrap();
        assert_eq!(got.synced, None);
    }

    #[test]
    fn test_from_lrclib_empty() {
        assert!(from_lrclib(track(r#"{"plainLyrics":"","syncedLyrics":null}"#)).is_none());
        assert!(from_lrclib(LrclibTrack::default()).is_none());
    }

    #[test]
    fn test_applicability() {
        let timeout = Duration::from_secs(10);
        let lrclib = LrclibClient::new(LrclibClient::DEFAULT_BASE_URL, timeout).unwrap();
        let ovh = LyricsOvhClient::new(LyricsOvhClient::DEFAULT_BASE_URL, timeout).unwrap();

        let with_all = SongQuery::new("Song", "Artist", Some(240.0));
        let no_artist = SongQuery::new("Song", "", Some(240.0));
        let no_duration = SongQuery::new("Song", "Artist", None);

        let exact = ExactMatchProvider::new(lrclib.clone());
        assert!(exact.applies_to(&with_all));
        assert!(!exact.applies_to(&no_duration));

        let search = SearchProvider::new(lrclib);
        assert!(search.applies_to(&no_artist));

        let plain = PlainApiProvider::new(ovh);
        assert!(plain.applies_to(&with_all));
        assert!(!plain.applies_to(&no_artist));
        assert!(!plain.applies_to(&SongQuery::new("Song", "   ", None)));
    }

    fn lrclib(server: &StubServer) -> LrclibClient {
        LrclibClient::new(&format!("{}/api", server.base_url), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_exact_match_request() {
        let server = StubServer::start(vec![route(
            "GET",
            "/api/get",
            200,
            r#"{"plainLyrics":"words","syncedLyrics":"[00:01.00]words"}"#,
        )])
        .await;
        let exact = ExactMatchProvider::new(lrclib(&server));

        let got = exact
            .try_resolve(&SongQuery::new("Song", "Artist", Some(199.6)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.synced.as_deref(), Some("[00:01.00]words"));
        assert_eq!(
            server.requests()[0].path,
            "/api/get?track_name=Song&artist_name=Artist&album_name=Artist&duration=200"
        );
    }

    #[tokio::test]
    async fn test_exact_match_not_found_and_failure() {
        let server = StubServer::start(vec![route("GET", "/api/get?track_name=Broken", 500, "")]).await;
        let exact = ExactMatchProvider::new(lrclib(&server));

        let missing = exact.try_resolve(&SongQuery::new("Missing", "Artist", Some(200.0))).await;
        assert!(matches!(missing, Ok(None)));
        let broken = exact.try_resolve(&SongQuery::new("Broken", "Artist", Some(200.0))).await;
        assert!(broken.is_err());
    }

    #[tokio::test]
    async fn test_search_takes_first_result() {
        let server = StubServer::start(vec![
            route(
                "GET",
                "/api/search?track_name=Song",
                200,
                r#"[{"plainLyrics":"first"},{"plainLyrics":"second","syncedLyrics":"[00:01.00]second"}]"#,
            ),
            route("GET", "/api/search?track_name=Nothing", 200, "[]"),
        ])
        .await;
        let search = SearchProvider::new(lrclib(&server));

        let got = search.try_resolve(&SongQuery::new("Song", "", None)).await.unwrap().unwrap();
        assert_eq!(got, ProviderLyrics::plain("first"));
        assert!(matches!(
            search.try_resolve(&SongQuery::new("Nothing", "", None)).await,
            Ok(None)
        ));
    }

    #[tokio::test]
    async fn test_plain_api_empty_lyrics_is_not_found() {
        let server = StubServer::start(vec![
            route("GET", "/v1/Artist/Empty", 200, r#"{"lyrics":""}"#),
            route("GET", "/v1/Artist/Song", 200, r#"{"lyrics":"la la\n"}"#),
        ])
        .await;
        let plain = PlainApiProvider::new(LyricsOvhClient::new(&server.base_url, Duration::from_secs(5)).unwrap());

        assert!(matches!(
            plain.try_resolve(&SongQuery::new("Empty", "Artist", None)).await,
            Ok(None)
        ));
        let got = plain.try_resolve(&SongQuery::new("Song", "Artist", None)).await.unwrap();
        assert_eq!(got, Some(ProviderLyrics::plain("la la\n")));
        assert!(plain.try_resolve(&SongQuery::new("Gone", "Artist", None)).await.is_err());
    }
}
