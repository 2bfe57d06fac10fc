use serde::Deserialize;

/// Speech-to-text result. Whisper's verbose output carries per-segment
/// timestamps; the plain output only has `text`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Transcription {
    pub fn has_timing(&self) -> bool {
        self.segments.iter().any(|s| !s.text.trim().is_empty())
    }

    /// Render segments as LRC, one `[mm:ss.xx]` cue per non-blank segment.
    pub fn to_lrc(&self) -> Option<String> {
        if !self.has_timing() {
            return None;
        }
        let lines: Vec<String> = self
            .segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| format!("{}{}", lrc_timestamp(s.start), s.text.trim()))
            .collect();
        Some(lines.join("\n"))
    }

    pub fn to_plain(&self) -> String {
        if self.has_timing() {
            self.segments
                .iter()
                .map(|s| s.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            self.text.trim().to_string()
        }
    }
}

fn lrc_timestamp(secs: f64) -> String {
    let centis = (secs.max(0.0) * 100.0).round() as u64;
    let min = centis / 6000;
    let sec = (centis / 100) % 60;
    let cs = centis % 100;
    format!("[{:02}:{:02}.{:02}]", min, sec, cs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::parser;

    fn verbose() -> Transcription {
        serde_json::from_str(
            r#"{"text":"First line Second line",
                "segments":[{"id":0,"start":0.0,"end":2.0,"text":" First line"},
                            {"id":1,"start":2.0,"end":5.0,"text":"  "},
                            {"id":2,"start":65.456,"end":70.0,"text":"Second line "}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_to_lrc() {
        let lrc = verbose().to_lrc().unwrap();
        assert_eq!(lrc, "[00:00.00]First line\n[01:05.46]Second line");

        let timeline = parser::parse(&lrc);
        assert_eq!(timeline.len(), 2);
        assert!((timeline.lines()[1].time_secs - 65.46).abs() < 1e-9);
    }

    #[test]
    fn test_flat_text_only() {
        let t: Transcription = serde_json::from_str(r#"{"text":" hello world "}"#).unwrap();
        assert_eq!(t.to_lrc(), None);
        assert_eq!(t.to_plain(), "hello world");
    }

    #[test]
    fn test_plain_from_segments() {
        assert_eq!(verbose().to_plain(), "First line\nSecond line");
    }
}
