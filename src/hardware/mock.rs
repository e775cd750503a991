//! Mock Hardware Implementations
//!
//! Provides a simulated `SensorSource` for testing and demos without physical
//! hardware. All timing uses tokio timers (never `std::thread::sleep`).
//!
//! # Modes
//!
//! - `SimulatedSensorSource::new` - every registration gets a background task that
//!   produces plausible readings at the requested period
//! - `SimulatedSensorSource::manual` - nothing is generated; tests inject readings
//!   with `emit` and drive failures with `reject` / `terminate`
//!
//! # Performance Characteristics
//!
//! - Requested period is clamped to the device's min delay, with a 1 ms floor
//!   (FASTEST on an on-change sensor would otherwise spin)

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

use crate::error::{AppResult, SensorError};
use crate::hardware::capabilities::{
    DeviceCatalog, ReadingSink, RegistrationHandle, SensorSource,
};
use crate::hardware::descriptor::{DeviceDescriptor, DeviceId, SamplingRate, SensorType};
use crate::hardware::registry::DeviceRegistry;
use crate::measurement_types::Reading;

/// Lower bound on the generator period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Accuracy code reported with simulated readings (high confidence).
const SIMULATED_ACCURACY: i32 = 3;

/// Descriptors of the devices a typical handset exposes.
pub fn default_devices() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor::new(SensorType::Accelerometer, "Simulated Accelerometer")
            .with_vendor("Simulated")
            .with_range(0.0024, 78.4)
            .with_delays(2_500, 200_000)
            .with_power(0.17),
        DeviceDescriptor::new(SensorType::Gyroscope, "Simulated Gyroscope")
            .with_vendor("Simulated")
            .with_range(0.0011, 34.9)
            .with_delays(2_500, 200_000)
            .with_power(0.55),
        DeviceDescriptor::new(SensorType::MagneticField, "Simulated Magnetometer")
            .with_vendor("Simulated")
            .with_range(0.15, 4912.0)
            .with_delays(10_000, 1_000_000)
            .with_power(0.6),
        DeviceDescriptor::new(SensorType::Gravity, "Simulated Gravity")
            .with_vendor("Simulated")
            .with_range(0.0024, 39.2)
            .with_delays(5_000, 200_000),
        DeviceDescriptor::new(SensorType::LinearAcceleration, "Simulated Linear Acceleration")
            .with_vendor("Simulated")
            .with_range(0.0024, 39.2)
            .with_delays(5_000, 200_000),
        DeviceDescriptor::new(SensorType::RotationVector, "Simulated Rotation Vector")
            .with_vendor("Simulated")
            .with_range(0.0000001, 1.0)
            .with_delays(5_000, 200_000),
        DeviceDescriptor::new(SensorType::GameRotationVector, "Simulated Game Rotation")
            .with_vendor("Simulated")
            .with_range(0.0000001, 1.0)
            .with_delays(5_000, 200_000),
        DeviceDescriptor::new(SensorType::Proximity, "Simulated Proximity")
            .with_vendor("Simulated")
            .with_range(1.0, 5.0)
            .with_power(0.1),
        DeviceDescriptor::new(SensorType::Light, "Simulated Ambient Light")
            .with_vendor("Simulated")
            .with_range(1.0, 43_000.0)
            .with_power(0.13),
        DeviceDescriptor::new(SensorType::Pressure, "Simulated Barometer")
            .with_vendor("Simulated")
            .with_range(0.0002, 1260.0)
            .with_delays(40_000, 1_000_000)
            .with_power(0.004),
        DeviceDescriptor::new(SensorType::StepCounter, "Simulated Step Counter")
            .with_vendor("Simulated")
            .with_range(1.0, 4_294_967_296.0),
    ]
}

struct SimRegistration {
    device: DeviceId,
    sink: ReadingSink,
    generator: Option<JoinHandle<()>>,
}

/// Simulated push-based sensor backend.
///
/// Devices exist iff they are registered and available in the backing
/// `DeviceRegistry`.
pub struct SimulatedSensorSource {
    catalog: Arc<DeviceRegistry>,
    registrations: Mutex<HashMap<u64, SimRegistration>>,
    rejected: Mutex<HashMap<DeviceId, String>>,
    next_id: AtomicU64,
    registered_total: AtomicU64,
    unregistered_total: AtomicU64,
    auto_generate: bool,
    clock: Instant,
}

impl SimulatedSensorSource {
    /// Source that generates readings for every registration.
    pub fn new(catalog: Arc<DeviceRegistry>) -> Self {
        Self::build(catalog, true)
    }

    /// Source that only delivers readings injected with `emit`.
    pub fn manual(catalog: Arc<DeviceRegistry>) -> Self {
        Self::build(catalog, false)
    }

    /// Generating source over [`default_devices`].
    pub fn with_default_devices() -> AppResult<Self> {
        Ok(Self::new(Arc::new(DeviceRegistry::with_devices(
            default_devices(),
        )?)))
    }

    fn build(catalog: Arc<DeviceRegistry>, auto_generate: bool) -> Self {
        Self {
            catalog,
            registrations: Mutex::new(HashMap::new()),
            rejected: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            registered_total: AtomicU64::new(0),
            unregistered_total: AtomicU64::new(0),
            auto_generate,
            clock: Instant::now(),
        }
    }

    /// Catalog backing this source.
    pub fn catalog(&self) -> Arc<DeviceRegistry> {
        Arc::clone(&self.catalog)
    }

    /// Make future registrations for `device` fail with `RegistrationFailure`.
    pub fn reject(&self, device: DeviceId, reason: impl Into<String>) {
        self.rejected.lock().insert(device, reason.into());
    }

    /// Undo `reject`.
    pub fn accept(&self, device: DeviceId) {
        self.rejected.lock().remove(&device);
    }

    /// Deliver a reading to every live registration for `device`.
    ///
    /// # Returns
    /// Number of listeners the reading was delivered to
    pub fn emit(&self, device: DeviceId, reading: Reading) -> usize {
        let sinks: Vec<ReadingSink> = self
            .registrations
            .lock()
            .values()
            .filter(|r| r.device == device)
            .map(|r| Arc::clone(&r.sink))
            .collect();
        for sink in &sinks {
            sink.on_reading(reading.clone());
        }
        sinks.len()
    }

    /// Simulate a backend fault: close every registration for `device`.
    ///
    /// # Returns
    /// Number of registrations closed
    pub fn terminate(&self, device: DeviceId) -> usize {
        let closed: Vec<SimRegistration> = {
            let mut registrations = self.registrations.lock();
            let ids: Vec<u64> = registrations
                .iter()
                .filter(|(_, r)| r.device == device)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| registrations.remove(&id))
                .collect()
        };
        for registration in &closed {
            if let Some(generator) = &registration.generator {
                generator.abort();
            }
            registration.sink.on_closed();
        }
        tracing::warn!(device, closed = closed.len(), "simulated backend terminated");
        closed.len()
    }

    /// Live registrations for `device`.
    pub fn active_registrations(&self, device: DeviceId) -> usize {
        self.registrations
            .lock()
            .values()
            .filter(|r| r.device == device)
            .count()
    }

    /// Total successful `register` calls.
    pub fn registration_count(&self) -> u64 {
        self.registered_total.load(Ordering::SeqCst)
    }

    /// Total `unregister` calls.
    pub fn unregistration_count(&self) -> u64 {
        self.unregistered_total.load(Ordering::SeqCst)
    }

    fn spawn_generator(
        &self,
        descriptor: DeviceDescriptor,
        rate: SamplingRate,
        sink: ReadingSink,
    ) -> Option<JoinHandle<()>> {
        if !self.auto_generate {
            return None;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                device = descriptor.type_id,
                "no tokio runtime; simulated device will stay silent"
            );
            return None;
        };
        let period = effective_period(rate, &descriptor);
        let clock = self.clock;
        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut rng = StdRng::from_entropy();
            let mut step: u64 = 0;
            loop {
                ticker.tick().await;
                let values = synthesize(&descriptor, step, &mut rng);
                let timestamp_ns = i64::try_from(clock.elapsed().as_nanos()).unwrap_or(i64::MAX);
                sink.on_reading(Reading::new(timestamp_ns, values, SIMULATED_ACCURACY));
                step += 1;
            }
        }))
    }
}

impl SensorSource for SimulatedSensorSource {
    fn register(
        &self,
        device: DeviceId,
        rate: SamplingRate,
        sink: ReadingSink,
    ) -> AppResult<RegistrationHandle> {
        if let Some(reason) = self.rejected.lock().get(&device) {
            return Err(SensorError::RegistrationFailure {
                device,
                reason: reason.clone(),
            });
        }
        let descriptor = self
            .catalog
            .describe(device)
            .ok()
            .filter(|d| d.available)
            .ok_or(SensorError::DeviceUnavailable(device))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let generator = self.spawn_generator(descriptor, rate, Arc::clone(&sink));
        self.registrations.lock().insert(
            id,
            SimRegistration {
                device,
                sink,
                generator,
            },
        );
        self.registered_total.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(device, registration = id, ?rate, "simulated listener registered");
        Ok(RegistrationHandle::new(id, device))
    }

    fn unregister(&self, handle: RegistrationHandle) {
        let removed = self.registrations.lock().remove(&handle.id());
        if let Some(generator) = removed.and_then(|r| r.generator) {
            generator.abort();
        }
        self.unregistered_total.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            device = handle.device(),
            registration = handle.id(),
            "simulated listener unregistered"
        );
    }
}

impl Drop for SimulatedSensorSource {
    fn drop(&mut self) {
        for (_, registration) in self.registrations.lock().drain() {
            if let Some(generator) = registration.generator {
                generator.abort();
            }
        }
    }
}

/// Generator period for a rate on a given device.
pub fn effective_period(rate: SamplingRate, descriptor: &DeviceDescriptor) -> Duration {
    let min_delay = Duration::from_micros(u64::try_from(descriptor.min_delay_us).unwrap_or(0));
    rate.period().max(min_delay).max(MIN_PERIOD)
}

/// Plausible values for one reading of a device.
fn synthesize(descriptor: &DeviceDescriptor, step: u64, rng: &mut StdRng) -> Vec<f32> {
    let phase = step as f32 * 0.05;
    let mut noise = |scale: f32| rng.gen_range(-scale..=scale);
    match descriptor.sensor_type() {
        Some(SensorType::Accelerometer) | Some(SensorType::Gravity) => vec![
            0.3 * phase.sin() + noise(0.05),
            0.2 * phase.cos() + noise(0.05),
            9.81 + noise(0.05),
        ],
        Some(SensorType::LinearAcceleration) | Some(SensorType::Gyroscope) => {
            vec![noise(0.2), noise(0.2), noise(0.2)]
        }
        Some(SensorType::MagneticField) => vec![
            22.0 + noise(1.0),
            -5.0 + noise(1.0),
            -40.0 + noise(1.0),
        ],
        Some(SensorType::RotationVector) | Some(SensorType::GameRotationVector) => {
            let half = phase * 0.5;
            vec![0.0, 0.0, half.sin(), half.cos()]
        }
        Some(SensorType::Light) => vec![(300.0 + 50.0 * phase.sin() + noise(5.0)).max(0.0)],
        Some(SensorType::Pressure) => vec![1013.25 + noise(0.05)],
        Some(SensorType::Proximity) => vec![if (step / 40) % 2 == 0 { 5.0 } else { 0.0 }],
        Some(SensorType::AmbientTemperature) => vec![22.0 + noise(0.1)],
        Some(SensorType::RelativeHumidity) => vec![45.0 + noise(0.5)],
        Some(SensorType::StepCounter) => vec![(step / 10) as f32],
        Some(SensorType::HeartRate) => vec![72.0 + noise(3.0)],
        _ => (0..descriptor.axis_count.max(1)).map(|_| noise(1.0)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::capabilities::ReadingListener;

    #[derive(Default)]
    struct Collect {
        readings: Mutex<Vec<Reading>>,
        closed: Mutex<bool>,
    }

    impl ReadingListener for Collect {
        fn on_reading(&self, reading: Reading) {
            self.readings.lock().push(reading);
        }

        fn on_closed(&self) {
            *self.closed.lock() = true;
        }
    }

    fn manual_source() -> SimulatedSensorSource {
        SimulatedSensorSource::manual(Arc::new(
            DeviceRegistry::with_devices(default_devices()).unwrap(),
        ))
    }

    #[test]
    fn test_unknown_device_unavailable() {
        let source = manual_source();
        let result = source.register(21, SamplingRate::Ui, Arc::new(Collect::default()));
        assert!(matches!(result, Err(SensorError::DeviceUnavailable(21))));
        assert_eq!(source.registration_count(), 0);
    }

    #[test]
    fn test_rejected_registration() {
        let source = manual_source();
        source.reject(1, "sensor busy");
        let result = source.register(1, SamplingRate::Ui, Arc::new(Collect::default()));
        assert!(matches!(
            result,
            Err(SensorError::RegistrationFailure { device: 1, .. })
        ));
        assert_eq!(source.active_registrations(1), 0);

        source.accept(1);
        assert!(source
            .register(1, SamplingRate::Ui, Arc::new(Collect::default()))
            .is_ok());
    }

    #[test]
    fn test_emit_reaches_only_live_registrations() {
        let source = manual_source();
        let sink = Arc::new(Collect::default());
        let handle = source.register(1, SamplingRate::Ui, sink.clone()).unwrap();

        assert_eq!(source.emit(1, Reading::new(1, vec![1.0, 2.0, 3.0], 3)), 1);
        assert_eq!(source.emit(4, Reading::new(2, vec![0.0, 0.0, 0.0], 3)), 0);

        source.unregister(handle);
        assert_eq!(source.emit(1, Reading::new(3, vec![1.0, 2.0, 3.0], 3)), 0);
        assert_eq!(sink.readings.lock().len(), 1);
        assert_eq!(source.unregistration_count(), 1);
    }

    #[test]
    fn test_terminate_closes_listeners() {
        let source = manual_source();
        let sink = Arc::new(Collect::default());
        let _handle = source.register(6, SamplingRate::Normal, sink.clone()).unwrap();

        assert_eq!(source.terminate(6), 1);
        assert!(*sink.closed.lock());
        assert_eq!(source.active_registrations(6), 0);
    }

    #[tokio::test]
    async fn test_generator_produces_readings_until_unregistered() {
        let source = SimulatedSensorSource::with_default_devices().unwrap();
        let sink = Arc::new(Collect::default());
        let handle = source.register(1, SamplingRate::Fastest, sink.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        source.unregister(handle);
        let produced = sink.readings.lock().len();
        assert!(produced > 0, "generator produced nothing");
        assert!(sink.readings.lock().iter().all(|r| r.axis_count() == 3));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(sink.readings.lock().len(), produced);
    }

    #[test]
    fn test_effective_period_is_clamped() {
        let accel = DeviceDescriptor::new(SensorType::Accelerometer, "a").with_delays(2_500, 0);
        assert_eq!(
            effective_period(SamplingRate::Fastest, &accel),
            Duration::from_micros(2_500)
        );
        assert_eq!(
            effective_period(SamplingRate::Normal, &accel),
            Duration::from_millis(200)
        );
        let light = DeviceDescriptor::new(SensorType::Light, "l");
        assert_eq!(effective_period(SamplingRate::Fastest, &light), MIN_PERIOD);
    }

    #[test]
    fn test_synthesized_axis_counts_match_descriptors() {
        let mut rng = StdRng::seed_from_u64(7);
        for descriptor in default_devices() {
            let values = synthesize(&descriptor, 3, &mut rng);
            assert_eq!(values.len(), descriptor.axis_count, "{}", descriptor.name);
        }
    }
}
