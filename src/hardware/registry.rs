//! Device Registry
//!
//! In-memory device catalog. Backends populate it with the descriptors of the
//! devices present on the host (from configuration, discovery or simulation) and
//! the rest of the crate queries it through the `DeviceCatalog` trait.
//!
//! # Example Usage
//!
//! ```rust
//! use sensor_daq::hardware::capabilities::DeviceCatalog;
//! use sensor_daq::hardware::descriptor::{DeviceDescriptor, SensorType};
//! use sensor_daq::hardware::registry::DeviceRegistry;
//!
//! let registry = DeviceRegistry::new();
//! registry
//!     .register(DeviceDescriptor::new(SensorType::Accelerometer, "LSM6DSO Accelerometer"))
//!     .unwrap();
//!
//! for info in registry.list_available() {
//!     println!("{}: {} ({})", info.type_id, info.name, info.category);
//! }
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{AppResult, SensorError};
use crate::hardware::capabilities::DeviceCatalog;
use crate::hardware::descriptor::{DeviceDescriptor, DeviceId};

/// Central registry of device descriptors, keyed by platform type id.
///
/// Interior mutability lets a registry be shared behind an `Arc` between the
/// catalog consumers and the backend that registers devices.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceId, DeviceDescriptor>>,
}

impl DeviceRegistry {
    /// Create a new empty device registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with descriptors.
    ///
    /// # Errors
    /// Returns `Configuration` if two descriptors share a type id.
    pub fn with_devices(devices: impl IntoIterator<Item = DeviceDescriptor>) -> AppResult<Self> {
        let registry = Self::new();
        for device in devices {
            registry.register(device)?;
        }
        Ok(registry)
    }

    /// Register a device descriptor.
    ///
    /// # Errors
    /// Returns `Configuration` if the type id is already registered.
    pub fn register(&self, descriptor: DeviceDescriptor) -> AppResult<()> {
        let descriptor = descriptor.normalized();
        let mut devices = self.devices.write();
        if devices.contains_key(&descriptor.type_id) {
            return Err(SensorError::Configuration(format!(
                "Device {} is already registered",
                descriptor.type_id
            )));
        }
        tracing::debug!(
            device = descriptor.type_id,
            name = %descriptor.name,
            category = ?descriptor.category,
            "registered device descriptor"
        );
        devices.insert(descriptor.type_id, descriptor);
        Ok(())
    }

    /// Remove a device.
    ///
    /// # Returns
    /// true if the device was found and removed
    pub fn unregister(&self, id: DeviceId) -> bool {
        self.devices.write().remove(&id).is_some()
    }

    /// Mark a device as (un)available without removing its descriptor.
    ///
    /// # Returns
    /// true if the device exists
    pub fn set_available(&self, id: DeviceId, available: bool) -> bool {
        match self.devices.write().get_mut(&id) {
            Some(device) => {
                device.available = available;
                true
            }
            None => false,
        }
    }

    /// Whether a device with this id is registered and available.
    pub fn contains(&self, id: DeviceId) -> bool {
        self.devices
            .read()
            .get(&id)
            .map(|d| d.available)
            .unwrap_or(false)
    }

    /// Number of registered devices, available or not.
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl DeviceCatalog for DeviceRegistry {
    fn list_available(&self) -> Vec<DeviceDescriptor> {
        let mut devices: Vec<DeviceDescriptor> = self
            .devices
            .read()
            .values()
            .filter(|d| d.available)
            .cloned()
            .collect();
        devices.sort_by_key(|d| (d.category, d.type_id));
        devices
    }

    fn describe(&self, id: DeviceId) -> AppResult<DeviceDescriptor> {
        self.devices
            .read()
            .get(&id)
            .cloned()
            .ok_or(SensorError::NotFound(id))
    }
}
