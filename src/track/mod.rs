//! Turning a video title and channel name into a song title and artist.

use regex::Regex;

const TAG_PATTERNS: [&str; 2] = [
    // (Official Music Video), [Lyrics], (HD) ...
    r"(?i)\s*[(\[][^)\]]*\b(?:official|video|audio|lyrics?|mv|hd|4k|visualizer)\b[^)\]]*[)\]]",
    // Unbracketed at the very end: "Song Official Video"
    r"(?i)\s+(?:official\s+)?(?:music\s+)?(?:video|audio|lyrics?|mv|hd|4k|visualizer)\s*$",
];

const CREDIT_PATTERN: &str = r"(?i)\s*[(\[]*\b(?:featuring|feat|ft|prod)(?:\.|\s)[^)\]]*[)\]]*";

const CHANNEL_PATTERNS: [&str; 2] = [r"(?i)\s*-\s*Topic$", r"VEVO$"];

fn strip(text: &str, patterns: &[&str]) -> String {
    let mut result = text.to_string();
    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            result = re.replace_all(&result, "").to_string();
        }
    }
    result.trim().to_string()
}

/// Split a raw video title into `(title, artist)`.
///
/// `"Artist - Song"` titles name their own artist; otherwise the channel
/// name is used. Anything after `|` is dropped, as are video tags and
/// feat./ft./prod. credits.
pub fn clean_title(raw_title: &str, channel: &str) -> (String, String) {
    let title = raw_title.split('|').next().unwrap_or_default().trim();

    let (artist, title) = match title.split_once(" - ") {
        Some((artist, rest)) => (artist.to_string(), rest.to_string()),
        None => (strip(channel, &CHANNEL_PATTERNS), title.to_string()),
    };

    let title = strip(&title, &TAG_PATTERNS);
    let title = strip(&title, &[CREDIT_PATTERN]);
    let artist = strip(&artist, &[CREDIT_PATTERN]);
    (title, artist)
}
