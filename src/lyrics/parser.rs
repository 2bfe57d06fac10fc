//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15.00] Another line
//!
//! Lines that don't start with a timestamp (metadata tags such as `[ti:...]`,
//! section headers, plain text) are skipped rather than rejected, so parsing
//! never fails.

/// A single line of lyrics with its cue time
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLyricLine {
    /// Seconds from the start of the track
    pub time_secs: f64,
    /// The lyrics text, trimmed and never empty
    pub text: String,
}

impl ParsedLyricLine {
    pub fn new(time_secs: f64, text: impl Into<String>) -> Self {
        Self {
            time_secs,
            text: text.into(),
        }
    }
}

/// Timed lyrics ordered by cue time.
///
/// Equal cue times keep the order they had in the source text. A timeline is
/// rebuilt from scratch whenever new synced lyrics arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTimeline {
    lines: Vec<ParsedLyricLine>,
}

impl ParsedTimeline {
    /// Parse LRC formatted lyrics
    pub fn parse(content: &str) -> Self {
        let mut lines: Vec<ParsedLyricLine> =
            content.trim_start_matches('\u{feff}').split('\n').filter_map(parse_timed_line).collect();

        // `sort_by` is stable, so ties stay in input order.
        lines.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));

        Self { lines }
    }

    pub fn lines(&self) -> &[ParsedLyricLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&ParsedLyricLine> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lyrics text without timestamps, one line per cue.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse raw LRC text into a timeline.
pub fn parse(raw: &str) -> ParsedTimeline {
    ParsedTimeline::parse(raw)
}

/// Parse a timed line like `[00:12.34]Lyrics`
fn parse_timed_line(line: &str) -> Option<ParsedLyricLine> {
    let rest = line.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    let time_secs = parse_timestamp(&rest[..end])?;

    let text = rest[end + 1..].trim();
    if text.is_empty() {
        return None;
    }

    Some(ParsedLyricLine::new(time_secs, text))
}

/// Parse timestamp string like "00:12", "00:12.34" or "00:12.340" to seconds
fn parse_timestamp(s: &str) -> Option<f64> {
    let (min, rest) = s.split_once(':')?;
    let (sec, frac) = match rest.split_once('.') {
        Some((sec, frac)) => (sec, Some(frac)),
        None => (rest, None),
    };

    if !is_digits(min, 2, 2) || !is_digits(sec, 2, 2) {
        return None;
    }

    // Fractions are right-padded to milliseconds: ".5" and ".50" are both 500 ms.
    let millis: u32 = match frac {
        None => 0,
        Some(f) if is_digits(f, 1, 3) => format!("{f:0<3}").parse().ok()?,
        Some(_) => return None,
    };

    let min: u32 = min.parse().ok()?;
    let sec: u32 = sec.parse().ok()?;
    Some(f64::from(min * 60 + sec) + f64::from(millis) / 1000.0)
}

fn is_digits(s: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}
