use super::PlayerEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Report wall-clock time as playback position, starting at `offset`.
///
/// For following along with lyrics when no media is being played through
/// mpv. Sends `Ended` once `duration` is reached, if given.
pub fn spawn(
    event_tx: mpsc::Sender<PlayerEvent>,
    offset: f64,
    duration: Option<f64>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now();
        if event_tx.send(PlayerEvent::Seek { seconds: offset }).await.is_err() {
            return;
        }

        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let seconds = offset + start.elapsed().as_secs_f64();
            if duration.is_some_and(|d| seconds >= d) {
                let _ = event_tx.send(PlayerEvent::Ended).await;
                return;
            }
            if event_tx.send(PlayerEvent::Position { seconds }).await.is_err() {
                return;
            }
        }
    })
}
