//! Measurement value types shared between the stream bridge, the controller and
//! the presentation boundary.
//!
//! This module provides the `Reading` type: one timestamped sample from a device.
//! Readings are immutable once produced. The value vector is private, so callers
//! can only obtain copies or shared borrows of it and never alias a buffer that
//! someone else mutates.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Maximum number of values a single reading carries.
pub const MAX_VALUES: usize = 4;

/// One observed sample.
///
/// # Fields
/// * `timestamp_ns` - Monotonic device-clock timestamp in nanoseconds
/// * `values` - 1 to 4 scalar values; length is fixed per device type
/// * `accuracy` - Small integer confidence code reported by the device
///
/// Equality is structural: two readings are equal iff timestamp, accuracy and
/// every value compare equal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    timestamp_ns: i64,
    values: Vec<f32>,
    accuracy: i32,
}

impl Reading {
    /// Create a reading.
    ///
    /// Backends are expected to pass 1 to [`MAX_VALUES`] values. Anything past
    /// [`MAX_VALUES`] is clamped off and an empty reading is kept as is; both
    /// cases are logged at warn level so a misbehaving backend is visible.
    pub fn new(timestamp_ns: i64, values: impl Into<Vec<f32>>, accuracy: i32) -> Self {
        let mut values = values.into();
        if values.len() > MAX_VALUES {
            tracing::warn!(
                timestamp_ns,
                received = values.len(),
                kept = MAX_VALUES,
                "reading carries too many values; extra values dropped"
            );
            values.truncate(MAX_VALUES);
        } else if values.is_empty() {
            tracing::warn!(timestamp_ns, "reading carries no values");
        }
        Self {
            timestamp_ns,
            values,
            accuracy,
        }
    }

    /// Device-clock timestamp in nanoseconds.
    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    /// Values in axis order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value for one axis, if present.
    pub fn value(&self, axis: usize) -> Option<f32> {
        self.values.get(axis).copied()
    }

    /// Number of axes carried.
    pub fn axis_count(&self) -> usize {
        self.values.len()
    }

    /// Accuracy code.
    pub fn accuracy(&self) -> i32 {
        self.accuracy
    }
}

impl Hash for Reading {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.timestamp_ns.hash(state);
        self.accuracy.hash(state);
        self.values.len().hash(state);
        for v in &self.values {
            // 0.0 == -0.0 must hash identically
            let bits = if *v == 0.0 { 0u32 } else { v.to_bits() };
            bits.hash(state);
        }
    }
}
