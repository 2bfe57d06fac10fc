//! Playback position providers.
//!
//! Lyrics sync only reads playback state; it never controls the player. Both
//! providers report through the same [`PlayerEvent`] channel.

pub mod clock;
pub mod mpv;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Started,
    Paused,
    /// Regular position report.
    Position { seconds: f64 },
    /// Position right after a seek; may move backwards.
    Seek { seconds: f64 },
    Duration { seconds: f64 },
    Ended,
    Error(String),
}
