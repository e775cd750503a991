//! Hardware Capabilities
//!
//! This module defines the seams between the streaming core and the outside world:
//!
//! - `SensorSource` - a push-based measurement backend (one implementation per
//!   hardware backend). Listeners are registered at a requested rate and receive
//!   readings on the backend's own thread or task.
//! - `ReadingListener` - the callback half of a registration.
//! - `DeviceCatalog` - enumeration and lookup of static device metadata.
//!
//! # Design Philosophy
//!
//! Each trait:
//! - Is thread-safe (requires Send + Sync)
//! - Uses `AppResult` for errors
//! - Focuses on ONE thing
//!
//! `SensorSource` is deliberately synchronous. Unregistration has to complete
//! before a cancellation call returns, including from `Drop`, where no executor
//! is available to drive a future.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Logger;
//!
//! impl ReadingListener for Logger {
//!     fn on_reading(&self, reading: Reading) {
//!         println!("{:?}", reading.values());
//!     }
//! }
//!
//! let handle = source.register(1, SamplingRate::Ui, Arc::new(Logger))?;
//! // ... readings arrive on the backend's thread ...
//! source.unregister(handle);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AppResult;
use crate::hardware::descriptor::{DeviceDescriptor, DeviceId, SamplingRate, SensorCategory};
use crate::hardware::labels;
use crate::measurement_types::Reading;

/// Callback receiving readings from a registered source.
///
/// # Contract
/// - Called from the backend's own thread or task, never from the consumer
/// - Must not block: the backend has no backpressure channel
/// - May be called zero, one or many times between any two consumer actions
pub trait ReadingListener: Send + Sync {
    /// A new reading was produced.
    fn on_reading(&self, reading: Reading);

    /// The backend will not deliver to this listener again.
    ///
    /// # Default Implementation
    /// Ignores the notification.
    fn on_closed(&self) {}
}

/// Shared listener handed to a source at registration time.
pub type ReadingSink = Arc<dyn ReadingListener>;

/// Proof of a live registration.
///
/// Not `Clone`: a handle is consumed by exactly one `unregister` call.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    id: u64,
    device: DeviceId,
}

impl RegistrationHandle {
    /// Create a handle. Intended for `SensorSource` implementations.
    pub fn new(id: u64, device: DeviceId) -> Self {
        Self { id, device }
    }

    /// Backend-assigned registration id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Device the registration is for.
    pub fn device(&self) -> DeviceId {
        self.device
    }
}

/// Capability: Push-based Measurement Delivery
///
/// # Contract
/// - `register` fails with `DeviceUnavailable` when no device with the id exists,
///   or `RegistrationFailure` when the backend refuses; in both cases nothing stays
///   registered
/// - While registered the device consumes power and bandwidth, so callers must
///   unregister promptly
/// - After `unregister` returns the listener receives no further readings
pub trait SensorSource: Send + Sync {
    /// Register `sink` for readings from `device` at the requested rate.
    fn register(
        &self,
        device: DeviceId,
        rate: SamplingRate,
        sink: ReadingSink,
    ) -> AppResult<RegistrationHandle>;

    /// Release a registration.
    fn unregister(&self, handle: RegistrationHandle);
}

/// Capability: Device Enumeration
///
/// Static metadata lookup. Descriptors returned are independent copies.
pub trait DeviceCatalog: Send + Sync {
    /// All available devices, sorted by category order.
    fn list_available(&self) -> Vec<DeviceDescriptor>;

    /// Look up a single device, failing with `NotFound`.
    fn describe(&self, id: DeviceId) -> AppResult<DeviceDescriptor>;

    /// Number of available devices.
    fn count(&self) -> usize {
        self.list_available().len()
    }

    /// Available devices grouped by category.
    fn by_category(&self) -> BTreeMap<SensorCategory, Vec<DeviceDescriptor>> {
        let mut groups: BTreeMap<SensorCategory, Vec<DeviceDescriptor>> = BTreeMap::new();
        for device in self.list_available() {
            groups.entry(device.category).or_default().push(device);
        }
        groups
    }

    /// Case-insensitive match on device name or sensor type label.
    ///
    /// An empty (or whitespace-only) query returns every available device.
    fn search(&self, query: &str) -> Vec<DeviceDescriptor> {
        let query = query.trim().to_lowercase();
        let devices = self.list_available();
        if query.is_empty() {
            return devices;
        }
        devices
            .into_iter()
            .filter(|d| {
                d.name.to_lowercase().contains(&query)
                    || labels::type_id_label(d.type_id)
                        .to_lowercase()
                        .contains(&query)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::hardware::descriptor::SensorType;

    struct FixedCatalog(Vec<DeviceDescriptor>);

    impl DeviceCatalog for FixedCatalog {
        fn list_available(&self) -> Vec<DeviceDescriptor> {
            self.0.clone()
        }

        fn describe(&self, id: DeviceId) -> AppResult<DeviceDescriptor> {
            self.0
                .iter()
                .find(|d| d.type_id == id)
                .cloned()
                .ok_or(SensorError::NotFound(id))
        }
    }

    fn catalog() -> FixedCatalog {
        FixedCatalog(vec![
            DeviceDescriptor::new(SensorType::Accelerometer, "BMI160 Accel"),
            DeviceDescriptor::new(SensorType::Gyroscope, "BMI160 Gyro"),
            DeviceDescriptor::new(SensorType::Light, "TMD4903 Ambient"),
        ])
    }

    #[test]
    fn search_matches_name_and_label_case_insensitively() {
        let c = catalog();
        assert_eq!(c.search("bmi160").len(), 2);
        assert_eq!(c.search("LIGHT").len(), 1);
        assert_eq!(c.search("gyro")[0].type_id, 4);
        assert!(c.search("barometer").is_empty());
        assert_eq!(c.search("  ").len(), 3);
    }

    #[test]
    fn groups_by_category() {
        let groups = catalog().by_category();
        assert_eq!(groups[&SensorCategory::Motion].len(), 2);
        assert_eq!(groups[&SensorCategory::Environment].len(), 1);
        assert!(!groups.contains_key(&SensorCategory::Position));
    }

    #[test]
    fn describe_unknown_is_not_found() {
        assert!(matches!(
            catalog().describe(99),
            Err(SensorError::NotFound(99))
        ));
        assert_eq!(catalog().count(), 3);
    }
}
