//! Incremental per-axis statistics.
//!
//! `StatisticsAccumulator` tracks min / max / sum / count for each axis over the
//! whole monitoring session. It is independent of `HistoryBuffer`: evicting a
//! value from the visible window does not remove it from the statistics.
//!
//! "No samples yet" is an explicit state (`min`/`max` are `None`), never a
//! numeric sentinel that real data could collide with.

use serde::Serialize;

/// Running statistics for one axis.
///
/// Invariant: `min` and `max` are `Some` iff `count > 0`, and then
/// `min <= every observed value <= max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunningStats {
    min: Option<f32>,
    max: Option<f32>,
    sum: f64,
    count: u64,
}

impl RunningStats {
    /// Fold one value in.
    ///
    /// # Returns
    /// false if the value is not finite (ignored)
    pub fn observe(&mut self, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        // Compute everything first, then commit in one assignment.
        let next = RunningStats {
            min: Some(self.min.map_or(value, |m| m.min(value))),
            max: Some(self.max.map_or(value, |m| m.max(value))),
            sum: self.sum + f64::from(value),
            count: self.count + 1,
        };
        *self = next;
        true
    }

    /// Smallest observed value, `None` before the first sample.
    pub fn min(&self) -> Option<f32> {
        self.min
    }

    /// Largest observed value, `None` before the first sample.
    pub fn max(&self) -> Option<f32> {
        self.max
    }

    /// Sum of observed values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of observed values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean; `0.0` when no samples were observed.
    ///
    /// Check `count()` to tell "no data" apart from a true zero mean.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Whether no samples were observed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-axis `RunningStats` for one device.
#[derive(Debug, Clone)]
pub struct StatisticsAccumulator {
    axes: Vec<RunningStats>,
}

impl StatisticsAccumulator {
    /// Create an accumulator for `axis_count` axes.
    pub fn new(axis_count: usize) -> Self {
        Self {
            axes: vec![RunningStats::default(); axis_count],
        }
    }

    /// Fold a value into one axis.
    ///
    /// # Returns
    /// false if the axis is out of range or the value is not finite
    pub fn observe(&mut self, axis: usize, value: f32) -> bool {
        self.axes
            .get_mut(axis)
            .map(|stats| stats.observe(value))
            .unwrap_or(false)
    }

    /// Mean of one axis (`0.0` for empty or unknown axes).
    pub fn average(&self, axis: usize) -> f64 {
        self.axis(axis).average()
    }

    /// Minimum of one axis.
    pub fn min(&self, axis: usize) -> Option<f32> {
        self.axis(axis).min()
    }

    /// Maximum of one axis.
    pub fn max(&self, axis: usize) -> Option<f32> {
        self.axis(axis).max()
    }

    /// Sample count of one axis.
    pub fn count(&self, axis: usize) -> u64 {
        self.axis(axis).count()
    }

    /// Statistics of one axis (empty stats for unknown axes).
    pub fn axis(&self, axis: usize) -> RunningStats {
        self.axes.get(axis).copied().unwrap_or_default()
    }

    /// Reset every axis to "no samples yet".
    pub fn reset(&mut self) {
        self.axes.fill(RunningStats::default());
    }

    /// Copy of all axes.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            axes: self.axes.clone(),
        }
    }
}

/// Immutable copy of a `StatisticsAccumulator`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Per-axis statistics
    pub axes: Vec<RunningStats>,
}

impl StatsSnapshot {
    /// Statistics of one axis (empty stats for unknown axes).
    pub fn axis(&self, axis: usize) -> RunningStats {
        self.axes.get(axis).copied().unwrap_or_default()
    }

    /// Whether no axis has samples.
    pub fn is_empty(&self) -> bool {
        self.axes.iter().all(RunningStats::is_empty)
    }
}
