use crate::lyrics::LyricsResult;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// What the AI produced for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKind {
    /// Transcribed lyrics, LRC when the transcript had timing.
    Lyrics,
    /// Chord sheet.
    Tabs,
}

impl GeneratedKind {
    fn as_str(self) -> &'static str {
        match self {
            GeneratedKind::Lyrics => "lyrics",
            GeneratedKind::Tabs => "tabs",
        }
    }
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS lyrics_cache (
  video_id TEXT PRIMARY KEY,
  plain TEXT NOT NULL,
  synced TEXT,
  source TEXT NOT NULL,
  fetched_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS generated (
  video_id TEXT NOT NULL,
  kind TEXT NOT NULL CHECK (kind IN ('lyrics', 'tabs')),
  content TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  PRIMARY KEY (video_id, kind)
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn cache_lyrics(&self, video_id: &str, lyrics: &LyricsResult, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(video_id, plain, synced, source, fetched_at)
VALUES(?1, ?2, ?3, ?4, ?5)
ON CONFLICT(video_id) DO UPDATE SET
  plain=excluded.plain,
  synced=excluded.synced,
  source=excluded.source,
  fetched_at=excluded.fetched_at
"#,
                params![
                    video_id,
                    lyrics.plain_text,
                    lyrics.synced_text,
                    lyrics.source_label,
                    now_unix
                ],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    pub fn get_lyrics(&self, video_id: &str) -> anyhow::Result<Option<LyricsResult>> {
        self.conn
            .query_row(
                "SELECT plain, synced, source FROM lyrics_cache WHERE video_id=?1",
                params![video_id],
                |row| {
                    Ok(LyricsResult {
                        plain_text: row.get(0)?,
                        synced_text: row.get(1)?,
                        source_label: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("query lyrics cache")
    }

    pub fn save_generated(
        &self,
        video_id: &str,
        kind: GeneratedKind,
        content: &str,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO generated(video_id, kind, content, created_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(video_id, kind) DO UPDATE SET
  content=excluded.content,
  created_at=excluded.created_at
"#,
                params![video_id, kind.as_str(), content, now_unix],
            )
            .context("save generated")?;
        Ok(())
    }

    pub fn get_generated(&self, video_id: &str, kind: GeneratedKind) -> anyhow::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT content FROM generated WHERE video_id=?1 AND kind=?2",
                params![video_id, kind.as_str()],
                |row| row.get(0),
            )
            .optional()
            .context("query generated")
    }

    /// Drop everything cached. Returns the number of rows removed.
    pub fn clear(&self) -> anyhow::Result<usize> {
        let lyrics = self
            .conn
            .execute("DELETE FROM lyrics_cache", [])
            .context("clear lyrics cache")?;
        let generated = self
            .conn
            .execute("DELETE FROM generated", [])
            .context("clear generated")?;
        Ok(lyrics + generated)
    }
}

pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
