//! Duration ledger: per-segment durations and global time mapping
//!
//! Unknown and failed segments count as zero seconds. They span no time on the
//! global timeline but stay addressable by index.

use serde::Serialize;

/// A global time translated into "which segment, what offset"
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub index: usize,
    pub offset_seconds: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DurationLedger {
    durations: Vec<Option<f64>>,
    total: f64,
}

impl DurationLedger {
    pub fn new(len: usize) -> Self {
        Self {
            durations: vec![None; len],
            total: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Set a segment's duration once its handle reports metadata
    ///
    /// Negative and non-finite values are stored as unknown.
    pub fn record_duration(&mut self, index: usize, seconds: f64) {
        if let Some(slot) = self.durations.get_mut(index) {
            *slot = (seconds.is_finite() && seconds >= 0.0).then_some(seconds);
            self.recompute_total();
        }
    }

    pub fn clear_duration(&mut self, index: usize) {
        if let Some(slot) = self.durations.get_mut(index) {
            *slot = None;
            self.recompute_total();
        }
    }

    pub fn duration(&self, index: usize) -> Option<f64> {
        self.durations.get(index).copied().flatten()
    }

    /// Duration with unknown treated as 0
    pub fn effective_duration(&self, index: usize) -> f64 {
        self.duration(index).unwrap_or(0.0)
    }

    pub fn total_seconds(&self) -> f64 {
        self.total
    }

    /// Sum of the durations of all segments before `index`
    pub fn cumulative_start(&self, index: usize) -> f64 {
        self.durations
            .iter()
            .take(index)
            .map(|d| d.unwrap_or(0.0))
            .sum()
    }

    /// Map a global time to a segment and offset
    ///
    /// Segment `i` owns `[start_i, end_i)`: a boundary belongs to the next
    /// segment. `t <= 0` maps to `(0, 0)` and `t >= total` maps to the end of
    /// the last segment.
    pub fn locate(&self, global_seconds: f64) -> Location {
        let Some(last) = self.durations.len().checked_sub(1) else {
            return Location {
                index: 0,
                offset_seconds: 0.0,
            };
        };

        if !(global_seconds > 0.0) {
            return Location {
                index: 0,
                offset_seconds: 0.0,
            };
        }
        if global_seconds >= self.total {
            return Location {
                index: last,
                offset_seconds: self.effective_duration(last),
            };
        }

        let mut start = 0.0;
        for (index, duration) in self.durations.iter().enumerate() {
            let end = start + duration.unwrap_or(0.0);
            if global_seconds >= start && global_seconds < end {
                return Location {
                    index,
                    offset_seconds: global_seconds - start,
                };
            }
            start = end;
        }

        // Only reachable through float rounding between the running sum and
        // the stored total.
        Location {
            index: last,
            offset_seconds: self.effective_duration(last),
        }
    }

    fn recompute_total(&mut self) {
        self.total = self.durations.iter().map(|d| d.unwrap_or(0.0)).sum();
    }
}
