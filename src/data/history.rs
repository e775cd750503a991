//! Bounded per-axis rolling history.
//!
//! `HistoryBuffer` keeps the most recent `capacity` values for each axis of one
//! device. When an axis window is full, the oldest value is evicted before the
//! new one is appended, so `len(axis) <= capacity` holds after every push.
//!
//! Readers never see the live buffers: `snapshot` returns independent copies.

use serde::Serialize;
use std::collections::VecDeque;

/// Default number of values kept per axis.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity, oldest-evicted rolling window per axis.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    capacity: usize,
    axes: Vec<VecDeque<T>>,
}

impl<T: Clone> HistoryBuffer<T> {
    /// Create a buffer for `axis_count` axes sharing one capacity.
    pub fn new(capacity: usize, axis_count: usize) -> Self {
        Self {
            capacity,
            axes: (0..axis_count)
                .map(|_| VecDeque::with_capacity(capacity))
                .collect(),
        }
    }

    /// Append a value to one axis, evicting that axis' oldest value when full.
    ///
    /// # Returns
    /// false if the axis index is out of range (value ignored)
    pub fn push(&mut self, axis: usize, value: T) -> bool {
        let capacity = self.capacity;
        let Some(window) = self.axes.get_mut(axis) else {
            return false;
        };
        if capacity == 0 {
            return true;
        }
        if window.len() == capacity {
            window.pop_front();
        }
        window.push_back(value);
        true
    }

    /// Copy of one axis' window, oldest to newest. Empty for unknown axes.
    pub fn snapshot(&self, axis: usize) -> Vec<T> {
        self.axes
            .get(axis)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of every axis' window.
    pub fn snapshot_all(&self) -> HistorySnapshot<T> {
        HistorySnapshot {
            capacity: self.capacity,
            axes: (0..self.axes.len()).map(|a| self.snapshot(a)).collect(),
        }
    }

    /// Empty every axis.
    pub fn clear(&mut self) {
        for window in &mut self.axes {
            window.clear();
        }
    }

    /// Number of values currently held for one axis.
    pub fn len(&self, axis: usize) -> usize {
        self.axes.get(axis).map(VecDeque::len).unwrap_or(0)
    }

    /// Whether every axis is empty.
    pub fn is_empty(&self) -> bool {
        self.axes.iter().all(VecDeque::is_empty)
    }

    /// Capacity shared by all axes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of axes tracked.
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }
}

/// Immutable copy of a `HistoryBuffer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySnapshot<T = f32> {
    /// Capacity of the buffer the snapshot was taken from
    pub capacity: usize,
    /// Per-axis windows, oldest to newest
    pub axes: Vec<Vec<T>>,
}

impl<T> HistorySnapshot<T> {
    /// One axis' window; empty slice for unknown axes.
    pub fn axis(&self, axis: usize) -> &[T] {
        self.axes.get(axis).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether every axis is empty.
    pub fn is_empty(&self) -> bool {
        self.axes.iter().all(Vec::is_empty)
    }
}

impl<T> Default for HistorySnapshot<T> {
    fn default() -> Self {
        Self {
            capacity: 0,
            axes: Vec::new(),
        }
    }
}
