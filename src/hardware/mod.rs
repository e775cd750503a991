//! Hardware abstraction layer.
//!
//! - `descriptor` - static device model and sampling rates
//! - `labels` - display strings for rates, categories and sensor types
//! - `capabilities` - `SensorSource` / `DeviceCatalog` traits
//! - `registry` - in-memory catalog
//! - `mock` - simulated backend for tests and demos

pub mod capabilities;
pub mod descriptor;
pub mod labels;
pub mod mock;
pub mod registry;

pub use capabilities::{
    DeviceCatalog, ReadingListener, ReadingSink, RegistrationHandle, SensorSource,
};
pub use descriptor::{DeviceDescriptor, DeviceId, SamplingRate, SensorCategory, SensorType};
pub use mock::SimulatedSensorSource;
pub use registry::DeviceRegistry;
