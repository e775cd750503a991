//! Custom error types for the application.
//!
//! This module defines the primary error type, `SensorError`, for the whole crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to handle
//! the failures that can occur, from configuration issues to hardware registration
//! problems.
//!
//! ## Error Hierarchy
//!
//! - **`DeviceUnavailable`**: The requested device does not exist on this host. Raised
//!   when a stream is opened; no partial subscription is ever created.
//! - **`RegistrationFailure`**: The hardware backend rejected the listener registration
//!   (permission, transient busy). Handled exactly like `DeviceUnavailable` by callers.
//! - **`NotFound`**: A catalog lookup for an unknown device id.
//! - **`Config`**: Wraps errors from `figment`, typically TOML syntax or type mismatches.
//! - **`Configuration`**: Semantic validation errors in an otherwise well-formed config.
//! - **`Io`**: Wraps `std::io::Error`.
//!
//! Delivery-path faults are deliberately absent: a stream that stops delivering is
//! observed as a stall or a closed stream, never as an error value.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, SensorError>;

/// Primary error type for sensor monitoring.
#[derive(Error, Debug)]
pub enum SensorError {
    /// No device with the given type id exists on this host.
    ///
    /// **Recovery Strategy**: retry with a valid id, or surface "not supported" in the UI.
    #[error("Device {0} is not available on this host")]
    DeviceUnavailable(i32),

    /// The hardware backend refused the listener registration.
    ///
    /// **Recovery Strategy**: same as `DeviceUnavailable`; the failed start leaves
    /// nothing registered, so the caller may simply retry later.
    #[error("Registration for device {device} rejected: {reason}")]
    RegistrationFailure {
        /// Device type id the registration was attempted for
        device: i32,
        /// Backend-supplied reason
        reason: String,
    },

    /// Catalog lookup for a device id that is not present.
    #[error("Device {0} not found in catalog")]
    NotFound(i32),

    /// Configuration file parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Standard I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SensorError {
    /// Whether this error aborted a `start` cleanly and can be retried.
    pub fn is_start_failure(&self) -> bool {
        matches!(
            self,
            SensorError::DeviceUnavailable(_) | SensorError::RegistrationFailure { .. }
        )
    }
}
