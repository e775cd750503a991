//! Static device metadata
//!
//! Types describing *what* a measurement device is, independent of whether it is
//! currently streaming:
//!
//! - `SensorType` - closed set of known platform sensor type ids
//! - `SensorCategory` - MOTION / POSITION / ENVIRONMENT / OTHER classification
//! - `SamplingRate` - requested delivery interval operating points
//! - `DeviceDescriptor` - immutable capability record produced by a catalog query
//!
//! Display strings live in [`crate::hardware::labels`], not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::hardware::labels;

/// Numeric platform identifier of a sensor type (e.g. 1 = accelerometer).
pub type DeviceId = i32;

// =============================================================================
// SensorType
// =============================================================================

/// Known sensor types, keyed by their platform type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorType {
    /// Acceleration including gravity (m/s^2, 3 axes)
    Accelerometer,
    /// Geomagnetic field strength (uT, 3 axes)
    MagneticField,
    /// Angular speed (rad/s, 3 axes)
    Gyroscope,
    /// Illuminance (lx)
    Light,
    /// Atmospheric pressure (hPa)
    Pressure,
    /// Proximity distance (cm)
    Proximity,
    /// Gravity vector (m/s^2, 3 axes)
    Gravity,
    /// Acceleration excluding gravity (m/s^2, 3 axes)
    LinearAcceleration,
    /// Rotation vector (unitless, 4 components)
    RotationVector,
    /// Relative humidity (%)
    RelativeHumidity,
    /// Ambient temperature (degrees C)
    AmbientTemperature,
    /// Rotation vector without geomagnetic reference
    GameRotationVector,
    /// One-shot significant motion trigger
    SignificantMotion,
    /// Step detected event
    StepDetector,
    /// Steps since last reboot
    StepCounter,
    /// Rotation vector from magnetometer instead of gyroscope
    GeomagneticRotationVector,
    /// Heart rate (bpm)
    HeartRate,
}

/// (type, platform id) pairs; the single source of truth for id mapping.
const TYPE_IDS: [(SensorType, DeviceId); 17] = [
    (SensorType::Accelerometer, 1),
    (SensorType::MagneticField, 2),
    (SensorType::Gyroscope, 4),
    (SensorType::Light, 5),
    (SensorType::Pressure, 6),
    (SensorType::Proximity, 8),
    (SensorType::Gravity, 9),
    (SensorType::LinearAcceleration, 10),
    (SensorType::RotationVector, 11),
    (SensorType::RelativeHumidity, 12),
    (SensorType::AmbientTemperature, 13),
    (SensorType::GameRotationVector, 15),
    (SensorType::SignificantMotion, 17),
    (SensorType::StepDetector, 18),
    (SensorType::StepCounter, 19),
    (SensorType::GeomagneticRotationVector, 20),
    (SensorType::HeartRate, 21),
];

impl SensorType {
    /// All known types in platform id order.
    pub fn all() -> impl Iterator<Item = SensorType> {
        TYPE_IDS.iter().map(|(t, _)| *t)
    }

    /// Look up a type by platform id.
    pub fn from_id(id: DeviceId) -> Option<SensorType> {
        TYPE_IDS.iter().find(|(_, i)| *i == id).map(|(t, _)| *t)
    }

    /// Platform type id.
    pub fn id(self) -> DeviceId {
        TYPE_IDS
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, id)| *id)
            .unwrap_or_default()
    }

    /// Category this type is classified into.
    pub fn category(self) -> SensorCategory {
        use SensorType::*;
        match self {
            Accelerometer | Gyroscope | Gravity | LinearAcceleration | StepCounter
            | StepDetector | SignificantMotion => SensorCategory::Motion,
            MagneticField | Proximity | RotationVector | GameRotationVector
            | GeomagneticRotationVector => SensorCategory::Position,
            Light | Pressure | AmbientTemperature | RelativeHumidity => {
                SensorCategory::Environment
            }
            HeartRate => SensorCategory::Other,
        }
    }

    /// Number of values carried by each reading of this type.
    pub fn axis_count(self) -> usize {
        use SensorType::*;
        match self {
            Accelerometer | MagneticField | Gyroscope | Gravity | LinearAcceleration => 3,
            RotationVector | GameRotationVector => 4,
            Light | Pressure | Proximity | AmbientTemperature | RelativeHumidity
            | StepCounter | HeartRate => 1,
            _ => 3,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(labels::sensor_type_label(*self))
    }
}

/// Category for an arbitrary platform id; unknown ids are `Other`.
pub fn category_for_id(id: DeviceId) -> SensorCategory {
    SensorType::from_id(id)
        .map(SensorType::category)
        .unwrap_or(SensorCategory::Other)
}

/// Axis count for an arbitrary platform id; unknown ids default to 3.
pub fn axis_count_for_id(id: DeviceId) -> usize {
    SensorType::from_id(id).map(SensorType::axis_count).unwrap_or(3)
}

// =============================================================================
// SensorCategory
// =============================================================================

/// Coarse classification of a device, in catalog display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorCategory {
    /// Acceleration, rotation and step sensors
    Motion,
    /// Orientation and proximity sensors
    Position,
    /// Ambient conditions (light, pressure, temperature, humidity)
    Environment,
    /// Anything else
    Other,
}

impl SensorCategory {
    /// All categories in display order.
    pub const ALL: [SensorCategory; 4] = [
        SensorCategory::Motion,
        SensorCategory::Position,
        SensorCategory::Environment,
        SensorCategory::Other,
    ];
}

impl fmt::Display for SensorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(labels::category_label(*self))
    }
}

impl FromStr for SensorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "motion" => Ok(SensorCategory::Motion),
            "position" => Ok(SensorCategory::Position),
            "environment" => Ok(SensorCategory::Environment),
            "other" => Ok(SensorCategory::Other),
            _ => Err(format!(
                "Invalid category '{}'. Must be one of: motion, position, environment, other",
                s
            )),
        }
    }
}

// =============================================================================
// SamplingRate
// =============================================================================

/// Requested delivery interval, ordered from coarsest to finest.
///
/// Selecting a rate is a request: the backend may deliver at a different
/// effective rate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SamplingRate {
    /// ~5 Hz, suitable for orientation changes
    Normal,
    /// ~15 Hz, suitable for user interface updates
    #[default]
    Ui,
    /// ~50 Hz, suitable for games
    Game,
    /// As fast as the hardware allows
    Fastest,
}

impl SamplingRate {
    /// All rates from coarsest to finest.
    pub const ALL: [SamplingRate; 4] = [
        SamplingRate::Normal,
        SamplingRate::Ui,
        SamplingRate::Game,
        SamplingRate::Fastest,
    ];

    /// Platform delay code (NORMAL=3 .. FASTEST=0).
    pub fn code(self) -> i32 {
        match self {
            SamplingRate::Normal => 3,
            SamplingRate::Ui => 2,
            SamplingRate::Game => 1,
            SamplingRate::Fastest => 0,
        }
    }

    /// Requested inter-sample interval. `Fastest` requests zero.
    pub fn period(self) -> Duration {
        match self {
            SamplingRate::Normal => Duration::from_micros(200_000),
            SamplingRate::Ui => Duration::from_micros(66_667),
            SamplingRate::Game => Duration::from_micros(20_000),
            SamplingRate::Fastest => Duration::ZERO,
        }
    }
}

impl fmt::Display for SamplingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(labels::rate_label(*self))
    }
}

impl FromStr for SamplingRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(SamplingRate::Normal),
            "ui" => Ok(SamplingRate::Ui),
            "game" => Ok(SamplingRate::Game),
            "fastest" => Ok(SamplingRate::Fastest),
            _ => Err(format!(
                "Invalid sampling rate '{}'. Must be one of: normal, ui, game, fastest",
                s
            )),
        }
    }
}

// =============================================================================
// DeviceDescriptor
// =============================================================================

/// Static capability record for one physical measurement device.
///
/// Created once at catalog query time and never mutated by the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Platform type id
    pub type_id: DeviceId,
    /// Human name reported by the device
    pub name: String,
    /// Vendor string
    #[serde(default)]
    pub vendor: String,
    /// Driver/firmware version
    #[serde(default)]
    pub version: i32,
    /// Smallest distinguishable change in reading units
    #[serde(default)]
    pub resolution: f32,
    /// Maximum range in reading units
    #[serde(default)]
    pub max_range: f32,
    /// Power draw in mA while active
    #[serde(default)]
    pub power_ma: f32,
    /// Minimum delay between events in microseconds (0 = on-change only)
    #[serde(default)]
    pub min_delay_us: i32,
    /// Maximum delay between events in microseconds
    #[serde(default)]
    pub max_delay_us: i32,
    /// Maximum number of batched events the FIFO can hold
    #[serde(default)]
    pub fifo_max_event_count: i32,
    /// Number of FIFO events reserved for this device
    #[serde(default)]
    pub fifo_reserved_event_count: i32,
    /// Whether the device can wake the host
    #[serde(default)]
    pub wake_up: bool,
    /// Whether the device was attached at runtime
    #[serde(default)]
    pub dynamic: bool,
    /// Classification, derived from `type_id` when omitted
    #[serde(default = "default_category")]
    pub category: SensorCategory,
    /// Whether the device is currently usable
    #[serde(default = "default_available")]
    pub available: bool,
    /// Values per reading, derived from `type_id` when zero
    #[serde(default)]
    pub axis_count: usize,
}

fn default_category() -> SensorCategory {
    SensorCategory::Other
}

fn default_available() -> bool {
    true
}

impl DeviceDescriptor {
    /// Descriptor for a known sensor type with category and axis count filled in.
    pub fn new(sensor_type: SensorType, name: impl Into<String>) -> Self {
        Self {
            type_id: sensor_type.id(),
            name: name.into(),
            vendor: String::new(),
            version: 1,
            resolution: 0.0,
            max_range: 0.0,
            power_ma: 0.0,
            min_delay_us: 0,
            max_delay_us: 0,
            fifo_max_event_count: 0,
            fifo_reserved_event_count: 0,
            wake_up: false,
            dynamic: false,
            category: sensor_type.category(),
            available: true,
            axis_count: sensor_type.axis_count(),
        }
    }

    /// Set the vendor string.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Set resolution and maximum range.
    pub fn with_range(mut self, resolution: f32, max_range: f32) -> Self {
        self.resolution = resolution;
        self.max_range = max_range;
        self
    }

    /// Set the min/max delay bounds in microseconds.
    pub fn with_delays(mut self, min_delay_us: i32, max_delay_us: i32) -> Self {
        self.min_delay_us = min_delay_us;
        self.max_delay_us = max_delay_us;
        self
    }

    /// Set the power draw in mA.
    pub fn with_power(mut self, power_ma: f32) -> Self {
        self.power_ma = power_ma;
        self
    }

    /// Fill in fields that are implied by the type id.
    ///
    /// Used for descriptors deserialized from configuration, where category and
    /// axis count may be left out.
    pub fn normalized(mut self) -> Self {
        if self.axis_count == 0 {
            self.axis_count = axis_count_for_id(self.type_id);
        }
        if self.category == SensorCategory::Other {
            self.category = category_for_id(self.type_id);
        }
        self
    }

    /// The known sensor type, if the id is recognised.
    pub fn sensor_type(&self) -> Option<SensorType> {
        SensorType::from_id(self.type_id)
    }

    /// Display name of the sensor type ("Unknown Sensor" for unknown ids).
    pub fn type_label(&self) -> &'static str {
        labels::type_id_label(self.type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_round_trip() {
        for t in SensorType::all() {
            assert_eq!(SensorType::from_id(t.id()), Some(t));
        }
        assert_eq!(SensorType::from_id(1), Some(SensorType::Accelerometer));
        assert_eq!(SensorType::from_id(999), None);
    }

    #[test]
    fn categories_follow_type_table() {
        assert_eq!(SensorType::Gyroscope.category(), SensorCategory::Motion);
        assert_eq!(SensorType::Proximity.category(), SensorCategory::Position);
        assert_eq!(SensorType::Pressure.category(), SensorCategory::Environment);
        assert_eq!(SensorType::HeartRate.category(), SensorCategory::Other);
        assert_eq!(category_for_id(12345), SensorCategory::Other);
    }

    #[test]
    fn axis_counts() {
        assert_eq!(SensorType::Accelerometer.axis_count(), 3);
        assert_eq!(SensorType::RotationVector.axis_count(), 4);
        assert_eq!(SensorType::Light.axis_count(), 1);
        assert_eq!(SensorType::StepDetector.axis_count(), 3);
        assert_eq!(axis_count_for_id(-7), 3);
    }

    #[test]
    fn sampling_rates_are_ordered_coarse_to_fine() {
        let codes: Vec<i32> = SamplingRate::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![3, 2, 1, 0]);
        assert!(SamplingRate::Normal < SamplingRate::Fastest);
        assert!(SamplingRate::Normal.period() > SamplingRate::Game.period());
        assert_eq!(SamplingRate::default(), SamplingRate::Ui);
    }

    #[test]
    fn sampling_rate_parses_case_insensitively() {
        assert_eq!("GAME".parse::<SamplingRate>(), Ok(SamplingRate::Game));
        assert_eq!("Ui".parse::<SamplingRate>(), Ok(SamplingRate::Ui));
        assert!("warp".parse::<SamplingRate>().is_err());
    }

    #[test]
    fn normalized_fills_implied_fields() {
        let d = DeviceDescriptor {
            category: SensorCategory::Other,
            axis_count: 0,
            ..DeviceDescriptor::new(SensorType::Light, "light")
        }
        .normalized();
        assert_eq!(d.category, SensorCategory::Environment);
        assert_eq!(d.axis_count, 1);
        assert_eq!(d.type_label(), "Light");
    }
}
