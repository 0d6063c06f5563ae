//! Progress sampler
//!
//! A fixed-period tick that is armed only while something is playing. Sampling
//! reads the session and playlist and never writes either.

use super::session::PlaybackSession;
use crate::playlist::Playlist;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Read-only view for the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Global playlist time in seconds
    pub current_time: f64,
    pub total_time: f64,
    pub current_index: usize,
    pub is_playing: bool,
}

impl ProgressSnapshot {
    pub fn zero() -> Self {
        Self {
            current_time: 0.0,
            total_time: 0.0,
            current_index: 0,
            is_playing: false,
        }
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}

pub struct ProgressSampler {
    period: Duration,
    ticker: Option<Interval>,
}

impl ProgressSampler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            ticker: None,
        }
    }

    /// Arm the ticker; a no-op when already running
    pub fn start(&mut self) {
        if self.ticker.is_none() {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            self.ticker = Some(ticker);
        }
    }

    pub fn stop(&mut self) {
        self.ticker = None;
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Wait for the next tick
    ///
    /// Pends forever while stopped, so it is safe inside `select!` without a
    /// guard.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// `cumulative_start(current) + position of the active handle`
    ///
    /// Without an active handle the position inside the current segment is
    /// whatever its handle retained (0 for a rewound or failed segment).
    pub fn sample(playlist: Option<&Playlist>, session: &PlaybackSession) -> ProgressSnapshot {
        let Some(playlist) = playlist else {
            return ProgressSnapshot {
                is_playing: session.is_playing(),
                ..ProgressSnapshot::zero()
            };
        };

        let index = session.current_index();
        let local = playlist
            .resource(index)
            .and_then(|r| r.handle())
            .map(|h| h.position_seconds())
            .unwrap_or(0.0);
        let total = playlist.total_duration_seconds();
        let current = (playlist.ledger().cumulative_start(index) + local).clamp(0.0, total);

        ProgressSnapshot {
            current_time: current,
            total_time: total,
            current_index: index,
            is_playing: session.is_playing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sampler_lifecycle() {
        let mut sampler = ProgressSampler::new(Duration::from_millis(5));
        assert!(!sampler.is_active());

        sampler.start();
        assert!(sampler.is_active());
        // First tick of a fresh interval completes immediately
        tokio::time::timeout(Duration::from_secs(1), sampler.tick())
            .await
            .unwrap();

        sampler.stop();
        assert!(!sampler.is_active());
        assert!(
            tokio::time::timeout(Duration::from_millis(30), sampler.tick())
                .await
                .is_err(),
            "stopped sampler must not tick"
        );
    }

    #[test]
    fn test_sample_without_playlist() {
        let snapshot = ProgressSampler::sample(None, &PlaybackSession::default());
        assert_eq!(snapshot, ProgressSnapshot::zero());
    }
}
