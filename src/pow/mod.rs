//! Hash puzzle for publish authorization.
//!
//! The community database hands out a `(prefix, target)` pair. A nonce solves
//! it when `SHA-256(prefix + nonce)` is below `target`, comparing the digest
//! and the decoded target byte by byte.

use crate::error::{LyricsError, Result};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;

/// Attempt ceiling matching the difficulty LRCLIB issues.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 100_000_000;

const PROGRESS_EVERY: u64 = 1_000_000;

/// Proof that a nonce solves a challenge, sent as `"<prefix>:<nonce>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishToken(String);

impl PublishToken {
    pub fn new(prefix: &str, nonce: u64) -> Self {
        Self(format!("{prefix}:{nonce}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into prefix and nonce. The nonce is after the last `:`.
    pub fn parts(&self) -> Option<(&str, u64)> {
        let (prefix, nonce) = self.0.rsplit_once(':')?;
        Some((prefix, nonce.parse().ok()?))
    }
}

impl fmt::Display for PublishToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unsigned big-endian comparison over the shared prefix of `a` and `b`.
///
/// Arrays of different length are not padded: `[1, 2]` equals `[1, 2, 3]`.
pub fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

pub fn decode_target(target_hex: &str) -> Result<Vec<u8>> {
    let target = hex::decode(target_hex.trim())
        .map_err(|_| LyricsError::Publish("malformed challenge target".to_string()))?;
    if target.is_empty() {
        return Err(LyricsError::Publish("malformed challenge target".to_string()));
    }
    Ok(target)
}

/// Lazily hashes `prefix + nonce` for nonce = 0, 1, 2, ...
///
/// The prefix is absorbed once and the hasher state cloned per nonce.
#[derive(Clone)]
pub struct NonceSearch {
    base: Sha256,
    next: Option<u64>,
}

impl NonceSearch {
    pub fn new(prefix: &str) -> Self {
        let mut base = Sha256::new();
        base.update(prefix.as_bytes());
        Self { base, next: Some(0) }
    }
}

impl Iterator for NonceSearch {
    type Item = (u64, [u8; 32]);

    fn next(&mut self) -> Option<Self::Item> {
        let nonce = self.next?;
        self.next = nonce.checked_add(1);

        let mut hasher = self.base.clone();
        hasher.update(nonce.to_string().as_bytes());
        Some((nonce, hasher.finalize().into()))
    }
}

pub fn digest(prefix: &str, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.finalize().into()
}

/// Find the smallest nonce in `[0, max_attempts)` whose digest is below the target.
///
/// CPU-bound; call [`solve_in_background`] from async code.
pub fn solve(prefix: &str, target_hex: &str, max_attempts: u64) -> Result<PublishToken> {
    let target = decode_target(target_hex)?;

    NonceSearch::new(prefix)
        .take_while(|(nonce, _)| *nonce < max_attempts)
        .inspect(|(nonce, _)| {
            if *nonce > 0 && nonce % PROGRESS_EVERY == 0 {
                tracing::debug!(attempts = *nonce, "proof-of-work in progress");
            }
        })
        .find(|(_, digest)| compare_bytes(digest, &target).is_lt())
        .map(|(nonce, _)| {
            tracing::debug!(nonce, "proof-of-work solved");
            PublishToken::new(prefix, nonce)
        })
        .ok_or(LyricsError::PuzzleUnsolved {
            attempts: max_attempts,
        })
}

/// [`solve`] on the blocking thread pool so the async runtime stays responsive.
pub async fn solve_in_background(prefix: String, target_hex: String, max_attempts: u64) -> Result<PublishToken> {
    tokio::task::spawn_blocking(move || solve(&prefix, &target_hex, max_attempts))
        .await
        .map_err(|e| LyricsError::Publish(format!("proof-of-work worker failed: {e}")))?
}

/// Re-check a token against a target.
pub fn verify(token: &PublishToken, target_hex: &str) -> bool {
    let (Some((prefix, nonce)), Ok(target)) = (token.parts(), decode_target(target_hex)) else {
        return false;
    };
    compare_bytes(&digest(prefix, nonce), &target).is_lt()
}
