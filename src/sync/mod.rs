//! Playback synchronization: maps a playback position to the lyric line
//! being sung.

use crate::lyrics::{ParsedLyricLine, ParsedTimeline};
use crate::player::PlayerEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// The line at a playback position and the one after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located<'a> {
    pub index: Option<usize>,
    pub current: Option<&'a ParsedLyricLine>,
    pub next: Option<&'a ParsedLyricLine>,
}

#[derive(Debug, Clone)]
pub struct PlaybackSynchronizer {
    timeline: ParsedTimeline,
}

impl PlaybackSynchronizer {
    pub fn new(timeline: ParsedTimeline) -> Self {
        Self { timeline }
    }

    pub fn timeline(&self) -> &ParsedTimeline {
        &self.timeline
    }

    /// Index of the last line whose cue is at or before `t`.
    pub fn current_index(&self, t: f64) -> Option<usize> {
        // NaN compares false, so it counts zero cues.
        let passed = self.timeline.lines().partition_point(|l| l.time_secs <= t);
        passed.checked_sub(1)
    }

    pub fn locate(&self, t: f64) -> Located<'_> {
        match self.current_index(t) {
            None => Located {
                index: None,
                current: None,
                next: None,
            },
            Some(i) => Located {
                index: Some(i),
                current: self.timeline.get(i),
                next: self.timeline.get(i + 1),
            },
        }
    }

    /// Follow player events, calling `on_change` whenever the current line
    /// changes.
    ///
    /// Positions are sampled every `poll`; a seek is applied right away.
    /// Returns when playback ends or the sender goes away.
    pub async fn drive<F>(&self, mut events: mpsc::Receiver<PlayerEvent>, poll: Duration, mut on_change: F)
    where
        F: FnMut(&Located<'_>),
    {
        let mut ticker = tokio::time::interval(poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut position: Option<f64> = None;
        let mut shown: Option<usize> = None;

        let mut relocate = |position: f64, shown: &mut Option<usize>| {
            let located = self.locate(position);
            if located.index != *shown {
                *shown = located.index;
                on_change(&located);
            }
        };

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(p) = position {
                        relocate(p, &mut shown);
                    }
                }
                ev = events.recv() => match ev {
                    Some(PlayerEvent::Position { seconds }) => position = Some(seconds),
                    Some(PlayerEvent::Seek { seconds }) => {
                        tracing::debug!(seconds, "seek");
                        position = Some(seconds);
                        relocate(seconds, &mut shown);
                    }
                    Some(PlayerEvent::Error(msg)) => tracing::warn!("{msg}"),
                    Some(PlayerEvent::Ended) | None => break,
                    Some(_) => {}
                },
            }
        }
    }
}

/// Playback position as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
