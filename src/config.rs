//! Configuration System using Figment
//!
//! Strongly-typed configuration for the monitor. Configuration is loaded from:
//! 1. `config/sensor_daq.toml` (base configuration, optional)
//! 2. Environment variables prefixed with `SENSOR_DAQ_`, nested keys split on `__`
//!
//! Every section has defaults, so a missing file yields `AppConfig::default()`.
//!
//! # Example
//! ```no_run
//! use sensor_daq::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("History capacity: {}", config.monitoring.history_capacity);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::data::history::DEFAULT_HISTORY_CAPACITY;
use crate::error::{AppResult, SensorError};
use crate::hardware::descriptor::{DeviceDescriptor, SamplingRate};
use crate::hardware::mock::default_devices;
use crate::hardware::registry::DeviceRegistry;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/sensor_daq.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SENSOR_DAQ_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Stream and history settings
    pub monitoring: MonitoringConfig,
    /// Simulated devices; empty means the built-in catalog
    pub devices: Vec<DeviceDescriptor>,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Sensor DAQ".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Values kept per axis in the rolling history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Rate used when none is requested
    #[serde(default)]
    pub default_rate: SamplingRate,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            default_rate: SamplingRate::default(),
        }
    }
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl AppConfig {
    /// Load configuration from `config/sensor_daq.toml` and environment variables
    ///
    /// Example override: `SENSOR_DAQ_MONITORING__HISTORY_CAPACITY=100`
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path).extract()?)
    }

    /// Provider chain used by `load_from`: defaults, then file, then environment.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let level = self.application.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(SensorError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.monitoring.history_capacity == 0 {
            return Err(SensorError::Configuration(
                "history_capacity must be at least 1".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for device in &self.devices {
            if !ids.insert(device.type_id) {
                return Err(SensorError::Configuration(format!(
                    "Duplicate device type id: {}",
                    device.type_id
                )));
            }
        }

        Ok(())
    }

    /// Catalog of configured devices, or the built-in one when none are listed.
    pub fn device_registry(&self) -> AppResult<DeviceRegistry> {
        if self.devices.is_empty() {
            DeviceRegistry::with_devices(default_devices())
        } else {
            DeviceRegistry::with_devices(self.devices.iter().cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::capabilities::DeviceCatalog;
    use crate::hardware::descriptor::{SensorCategory, SensorType};
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitoring.history_capacity, 50);
        assert_eq!(config.monitoring.default_rate, SamplingRate::Ui);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::figment(dir.path().join("absent.toml"))
            .extract::<AppConfig>()
            .unwrap();
        assert_eq!(config.application, ApplicationConfig::default());
        assert_eq!(config.monitoring, MonitoringConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            [application]
            name = "Bench Monitor"
            log_level = "debug"

            [monitoring]
            history_capacity = 120
            default_rate = "game"

            [[devices]]
            type_id = 13
            name = "Lab Thermometer"
            vendor = "Acme"
            "#,
        );
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.application.name, "Bench Monitor");
        assert_eq!(config.monitoring.history_capacity, 120);
        assert_eq!(config.monitoring.default_rate, SamplingRate::Game);
        assert_eq!(config.devices.len(), 1);
        assert!(config.validate().is_ok());

        let registry = config.device_registry().unwrap();
        let thermometer = registry.describe(13).unwrap();
        assert_eq!(thermometer.category, SensorCategory::Environment);
        assert_eq!(thermometer.axis_count, 1);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.application.log_level = "verbose".to_string();
        assert!(matches!(
            config.validate(),
            Err(SensorError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = AppConfig::default();
        config.monitoring.history_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_device_ids() {
        let config = AppConfig {
            devices: vec![
                DeviceDescriptor::new(SensorType::Light, "Light A"),
                DeviceDescriptor::new(SensorType::Light, "Light B"),
            ],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate device type id: 5"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let file = write_config("[monitoring]\nhistory_capacity = \"many\"\n");
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(SensorError::Config(_))
        ));
    }

    #[test]
    fn test_empty_devices_use_builtin_catalog() {
        let registry = AppConfig::default().device_registry().unwrap();
        assert_eq!(registry.count(), default_devices().len());
    }
}
