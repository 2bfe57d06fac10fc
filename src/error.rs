//! Error taxonomy for lyrics resolution and publishing.
//!
//! HTTP clients and the CLI work with `anyhow`; the operations that callers
//! branch on (resolve, solve, publish) return [`LyricsError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LyricsError {
    /// Every provider was tried and none produced usable lyrics.
    #[error("Could not find lyrics. Try searching with a different song title.")]
    NotFound,

    /// The terminal provider failed abnormally.
    #[error("{provider} request failed: {message}")]
    Remote { provider: String, message: String },

    /// No nonce below the attempt ceiling satisfied the challenge.
    #[error("Failed to publish: proof-of-work not solved after {attempts} attempts")]
    PuzzleUnsolved { attempts: u64 },

    /// A step of the publish protocol failed.
    #[error("{0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, LyricsError>;
