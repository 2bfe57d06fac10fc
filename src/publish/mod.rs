//! Contributing lyrics back to the community database.
//!
//! Publishing is a three-step exchange: fetch a challenge, solve it, then
//! submit the track with the resulting token. Any failed step ends the
//! attempt; retrying is up to the caller.

use crate::error::{LyricsError, Result};
use crate::pow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::pow::PublishToken;

/// Single-use puzzle issued by the community database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Challenge {
    pub prefix: String,
    /// Hex-encoded byte string the digest must stay below.
    pub target: String,
}

/// Track submitted to the community database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackContribution {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    pub plain_lyrics: String,
    pub synced_lyrics: Option<String>,
}

impl TrackContribution {
    fn validate(&self) -> Result<()> {
        if self.plain_lyrics.trim().is_empty() {
            return Err(LyricsError::Publish("No generated lyrics to publish".to_string()));
        }
        if self.track_name.trim().is_empty() {
            return Err(LyricsError::Publish("Track name is required to publish".to_string()));
        }
        if self.artist_name.trim().is_empty() {
            return Err(LyricsError::Publish("Artist name is required to publish".to_string()));
        }
        Ok(())
    }
}

/// Remote side of the publish exchange.
#[async_trait]
pub trait CommunityService: Send + Sync {
    async fn request_challenge(&self) -> Result<Challenge>;
    async fn submit(&self, contribution: &TrackContribution, token: &PublishToken) -> Result<()>;
}

pub struct PublishCoordinator<S> {
    service: S,
    max_attempts: u64,
}

impl<S: CommunityService> PublishCoordinator<S> {
    pub fn new(service: S, max_attempts: u64) -> Self {
        Self { service, max_attempts }
    }

    pub async fn publish(&self, contribution: &TrackContribution) -> Result<()> {
        contribution.validate()?;

        let challenge = self.service.request_challenge().await?;
        if challenge.prefix.is_empty() || challenge.target.trim().is_empty() {
            return Err(LyricsError::Publish("malformed challenge".to_string()));
        }
        tracing::info!(prefix = %challenge.prefix, "solving publish challenge");

        let target = challenge.target.clone();
        let token = pow::solve_in_background(challenge.prefix, challenge.target, self.max_attempts).await?;
        if !pow::verify(&token, &target) {
            return Err(LyricsError::Publish("proof-of-work token failed verification".to_string()));
        }

        tracing::info!(track = %contribution.track_name, "submitting lyrics");
        self.service.submit(contribution, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const LENIENT: &str = "00ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

    struct FakeService {
        challenge: Result<Challenge>,
        submit_error: Option<String>,
        submitted: Mutex<Vec<(TrackContribution, PublishToken)>>,
        challenges_issued: Mutex<usize>,
    }

    impl FakeService {
        fn with_challenge(prefix: &str, target: &str) -> Self {
            Self {
                challenge: Ok(Challenge {
                    prefix: prefix.to_string(),
                    target: target.to_string(),
                }),
                submit_error: None,
                submitted: Mutex::new(Vec::new()),
                challenges_issued: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CommunityService for FakeService {
        async fn request_challenge(&self) -> Result<Challenge> {
            *self.challenges_issued.lock().unwrap() += 1;
            match &self.challenge {
                Ok(c) => Ok(c.clone()),
                Err(e) => Err(LyricsError::Publish(e.to_string())),
            }
        }

        async fn submit(&self, contribution: &TrackContribution, token: &PublishToken) -> Result<()> {
            if let Some(msg) = &self.submit_error {
                return Err(LyricsError::Publish(msg.clone()));
            }
            self.submitted
                .lock()
                .unwrap()
                .push((contribution.clone(), token.clone()));
            Ok(())
        }
    }

    fn contribution() -> TrackContribution {
        TrackContribution {
            track_name: "Test Song".to_string(),
            artist_name: "Test Artist".to_string(),
            album_name: "Test Album".to_string(),
            duration_secs: 240,
            plain_lyrics: "These are the lyrics".to_string(),
            synced_lyrics: Some("[00:01.00]These are the lyrics".to_string()),
        }
    }

    #[tokio::test]
    async fn test_publish_flow() {
        let coordinator = PublishCoordinator::new(FakeService::with_challenge("abc", LENIENT), 100_000);
        coordinator.publish(&contribution()).await.unwrap();

        let submitted = coordinator.service.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let (sent, token) = &submitted[0];
        assert_eq!(sent, &contribution());
        assert!(token.as_str().starts_with("abc:"));
        assert!(pow::verify(token, LENIENT));
    }

    #[tokio::test]
    async fn test_challenge_failure_keeps_remote_message() {
        let mut service = FakeService::with_challenge("abc", LENIENT);
        service.challenge = Err(LyricsError::Publish("Too many requests".to_string()));
        let err = PublishCoordinator::new(service, 100_000)
            .publish(&contribution())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Too many requests");
    }

    #[tokio::test]
    async fn test_malformed_challenge() {
        for (prefix, target) in [("", LENIENT), ("abc", ""), ("abc", "not-hex")] {
            let coordinator = PublishCoordinator::new(FakeService::with_challenge(prefix, target), 100);
            let err = coordinator.publish(&contribution()).await.unwrap_err();
            assert!(matches!(err, LyricsError::Publish(_)), "{prefix:?}/{target:?}");
            assert!(coordinator.service.submitted.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unsolved_puzzle_is_not_submitted() {
        let coordinator = PublishCoordinator::new(FakeService::with_challenge("abc", "00000000"), 5);
        let err = coordinator.publish(&contribution()).await.unwrap_err();
        assert!(matches!(err, LyricsError::PuzzleUnsolved { attempts: 5 }));
        assert!(coordinator.service.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure() {
        let mut service = FakeService::with_challenge("abc", LENIENT);
        service.submit_error = Some("The provided publish token is incorrect".to_string());
        let err = PublishCoordinator::new(service, 100_000)
            .publish(&contribution())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The provided publish token is incorrect");
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_request() {
        let coordinator = PublishCoordinator::new(FakeService::with_challenge("abc", LENIENT), 100_000);
        let mut empty = contribution();
        empty.plain_lyrics = "  ".to_string();

        let err = coordinator.publish(&empty).await.unwrap_err();
        assert_eq!(err.to_string(), "No generated lyrics to publish");
        assert_eq!(*coordinator.service.challenges_issued.lock().unwrap(), 0);
    }

    #[test]
    fn test_contribution_json() {
        let v = serde_json::to_value(contribution()).unwrap();
        assert_eq!(v["trackName"], "Test Song");
        assert_eq!(v["albumName"], "Test Album");
        assert_eq!(v["duration"], 240);
        assert_eq!(v["syncedLyrics"], "[00:01.00]These are the lyrics");
    }
}
