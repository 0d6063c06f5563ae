//! Transport clock handle
//!
//! Tracks the position of a clip of known duration against the tokio clock and
//! posts [`MediaEvent::Ended`] when the clip runs out. It renders no samples:
//! the listening client plays the audio, the server keeps the authoritative
//! position and sequencing.

use super::{HandleStatus, MediaError, MediaEvent, MediaHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

pub struct ClockHandle {
    segment: usize,
    duration: f64,
    /// Position at the moment `started_at` was taken (or while stopped)
    base_position: f64,
    started_at: Option<Instant>,
    end_at: Option<Instant>,
    volume: f32,
    events: mpsc::UnboundedSender<MediaEvent>,
    timer: Option<JoinHandle<()>>,
}

impl ClockHandle {
    pub fn new(segment: usize, duration_seconds: f64, events: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self {
            segment,
            duration: duration_seconds.max(0.0),
            base_position: 0.0,
            started_at: None,
            end_at: None,
            volume: 1.0,
            events,
            timer: None,
        }
    }

    fn arm(&mut self) {
        self.disarm();

        let now = Instant::now();
        let remaining = Duration::from_secs_f64((self.duration - self.base_position).max(0.0));
        let end_at = now + remaining;
        self.started_at = Some(now);
        self.end_at = Some(end_at);

        let events = self.events.clone();
        let segment = self.segment;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(end_at).await;
            trace!("Clock for segment {} reached end of media", segment);
            let _ = events.send(MediaEvent::Ended { segment });
        }));
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.started_at = None;
        self.end_at = None;
    }

    fn has_run_out(&self) -> bool {
        self.end_at.map_or(false, |end| Instant::now() >= end)
    }
}

impl MediaHandle for ClockHandle {
    fn duration_seconds(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn position_seconds(&self) -> f64 {
        match self.started_at {
            Some(_) if self.has_run_out() => self.duration,
            Some(start) => (self.base_position + start.elapsed().as_secs_f64()).min(self.duration),
            None => self.base_position,
        }
    }

    fn status(&self) -> HandleStatus {
        if self.started_at.is_some() {
            if self.has_run_out() {
                HandleStatus::Ended
            } else {
                HandleStatus::Sounding
            }
        } else if self.base_position > 0.0 {
            HandleStatus::Paused
        } else {
            HandleStatus::Idle
        }
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if self.started_at.is_some() && !self.has_run_out() {
            return Ok(());
        }
        if self.has_run_out() {
            self.base_position = self.duration;
        }
        self.arm();
        Ok(())
    }

    fn pause(&mut self) {
        if self.started_at.is_some() {
            self.base_position = self.position_seconds();
            self.disarm();
        }
    }

    fn seek(&mut self, offset_seconds: f64) {
        let sounding = self.started_at.is_some();
        self.disarm();
        self.base_position = offset_seconds.clamp(0.0, self.duration);
        if sounding {
            self.arm();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clock_runs_to_end_and_notifies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = ClockHandle::new(4, 0.05, tx);
        assert_eq!(handle.status(), HandleStatus::Idle);

        handle.play().unwrap();
        assert_eq!(handle.status(), HandleStatus::Sounding);

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("end-of-media not delivered")
            .unwrap();
        assert_eq!(event, MediaEvent::Ended { segment: 4 });
        assert_eq!(handle.status(), HandleStatus::Ended);
        assert_eq!(handle.position_seconds(), 0.05);
    }

    #[tokio::test]
    async fn test_pause_retains_position_and_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = ClockHandle::new(0, 0.2, tx);

        handle.play().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.pause();

        let position = handle.position_seconds();
        assert!(position > 0.0 && position < 0.2);
        assert_eq!(handle.status(), HandleStatus::Paused);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err(), "paused handle must not report end");
        assert_eq!(handle.position_seconds(), position);
    }

    #[tokio::test]
    async fn test_stop_rewinds() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut handle = ClockHandle::new(0, 10.0, tx);
        handle.seek(4.0);
        assert_eq!(handle.status(), HandleStatus::Paused);
        assert_eq!(handle.position_seconds(), 4.0);

        handle.play().unwrap();
        handle.stop();
        assert_eq!(handle.status(), HandleStatus::Idle);
        assert_eq!(handle.position_seconds(), 0.0);
    }

    #[tokio::test]
    async fn test_seek_is_clamped() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut handle = ClockHandle::new(0, 3.0, tx);
        handle.seek(-1.0);
        assert_eq!(handle.position_seconds(), 0.0);
        handle.seek(99.0);
        assert_eq!(handle.position_seconds(), 3.0);
    }
}
