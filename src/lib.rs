//! # Sensor DAQ Core Library
//!
//! Live readings from motion, position and environment sensors, exposed as a
//! cancellable stream and folded into bounded per-axis history and running
//! statistics. Pause/resume, sampling-rate changes and resets never block the
//! caller.
//!
//! ## Crate Structure
//!
//! - **`hardware`**: Device model (`SensorType`, `DeviceDescriptor`, `SamplingRate`),
//!   the `SensorSource` and `DeviceCatalog` traits, an in-memory registry and a
//!   simulated backend.
//! - **`measurement_types`**: The immutable `Reading` value type.
//! - **`stream`**: Bridge from push callbacks to a single-consumer `Stream` with a
//!   latest-wins slot.
//! - **`data`**: `HistoryBuffer` and `StatisticsAccumulator`.
//! - **`modules`**: `StreamController`, the per-device state machine, and the
//!   `Observable` values it publishes.
//! - **`config`**: Figment-based configuration loading and validation.
//! - **`logging`**: Tracing subscriber setup.
//! - **`error`**: The crate-wide `SensorError` enum.
//!
//! ## Data flow
//!
//! ```text
//! SensorSource ──> StreamBridge ──> StreamController (pause gate)
//!                                        │
//!                         ┌──────────────┴──────────────┐
//!                         v                             v
//!                   HistoryBuffer              StatisticsAccumulator
//!                         └──────────> Observable <─────┘
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod measurement_types;
pub mod modules;
pub mod stream;

pub use error::{AppResult, SensorError};
pub use measurement_types::Reading;
pub use modules::controller::{SessionCounters, StreamController, SubscriptionState};
