//! Display strings for the closed hardware enums.
//!
//! Kept apart from the domain types so that presentation text never leaks into
//! stream or statistics logic.

use crate::hardware::descriptor::{DeviceId, SamplingRate, SensorCategory, SensorType};

const RATE_LABELS: [(SamplingRate, &str); 4] = [
    (SamplingRate::Normal, "Normal"),
    (SamplingRate::Ui, "UI"),
    (SamplingRate::Game, "Game"),
    (SamplingRate::Fastest, "Fastest"),
];

const CATEGORY_LABELS: [(SensorCategory, &str); 4] = [
    (SensorCategory::Motion, "Motion Sensors"),
    (SensorCategory::Position, "Position Sensors"),
    (SensorCategory::Environment, "Environment Sensors"),
    (SensorCategory::Other, "Other Sensors"),
];

const TYPE_LABELS: [(SensorType, &str); 17] = [
    (SensorType::Accelerometer, "Accelerometer"),
    (SensorType::MagneticField, "Magnetic Field"),
    (SensorType::Gyroscope, "Gyroscope"),
    (SensorType::Light, "Light"),
    (SensorType::Pressure, "Pressure"),
    (SensorType::Proximity, "Proximity"),
    (SensorType::Gravity, "Gravity"),
    (SensorType::LinearAcceleration, "Linear Acceleration"),
    (SensorType::RotationVector, "Rotation Vector"),
    (SensorType::RelativeHumidity, "Humidity"),
    (SensorType::AmbientTemperature, "Temperature"),
    (SensorType::GameRotationVector, "Game Rotation"),
    (SensorType::SignificantMotion, "Significant Motion"),
    (SensorType::StepDetector, "Step Detector"),
    (SensorType::StepCounter, "Step Counter"),
    (SensorType::GeomagneticRotationVector, "Geomagnetic Rotation"),
    (SensorType::HeartRate, "Heart Rate"),
];

const UNKNOWN_SENSOR: &str = "Unknown Sensor";

/// Display name of a sampling rate.
pub fn rate_label(rate: SamplingRate) -> &'static str {
    lookup(&RATE_LABELS, rate).unwrap_or("Unknown")
}

/// Display name of a category.
pub fn category_label(category: SensorCategory) -> &'static str {
    lookup(&CATEGORY_LABELS, category).unwrap_or(UNKNOWN_SENSOR)
}

/// Display name of a sensor type.
pub fn sensor_type_label(sensor_type: SensorType) -> &'static str {
    lookup(&TYPE_LABELS, sensor_type).unwrap_or(UNKNOWN_SENSOR)
}

/// Display name for a raw platform id.
pub fn type_id_label(id: DeviceId) -> &'static str {
    SensorType::from_id(id)
        .map(sensor_type_label)
        .unwrap_or(UNKNOWN_SENSOR)
}

fn lookup<K: PartialEq + Copy>(table: &[(K, &'static str)], key: K) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_labels() {
        assert_eq!(rate_label(SamplingRate::Normal), "Normal");
        assert_eq!(rate_label(SamplingRate::Ui), "UI");
        assert_eq!(rate_label(SamplingRate::Game), "Game");
        assert_eq!(rate_label(SamplingRate::Fastest), "Fastest");
    }

    #[test]
    fn every_type_has_a_label() {
        for t in SensorType::all() {
            assert_ne!(sensor_type_label(t), UNKNOWN_SENSOR, "{:?}", t);
        }
        assert_eq!(type_id_label(4), "Gyroscope");
        assert_eq!(type_id_label(-1), "Unknown Sensor");
    }

    #[test]
    fn category_labels() {
        assert_eq!(category_label(SensorCategory::Environment), "Environment Sensors");
        assert_eq!(SensorCategory::Motion.to_string(), "Motion Sensors");
    }
}
