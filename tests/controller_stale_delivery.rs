//! Controller behaviour when a source keeps calling listeners it was told to
//! release.
//!
//! `RetainingSource` never forgets a sink: `unregister` only counts the call.
//! Readings pushed into a released sink must never reach controller state.

use parking_lot::Mutex;
use sensor_daq::hardware::{
    DeviceId, ReadingListener, ReadingSink, RegistrationHandle, SamplingRate, SensorSource,
};
use sensor_daq::{AppResult, Reading, StreamController};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEVICE: DeviceId = 1;

#[derive(Default)]
struct RetainingSource {
    sinks: Mutex<Vec<(u64, ReadingSink)>>,
    next_id: AtomicU64,
    unregistered: AtomicU64,
}

impl RetainingSource {
    fn latest_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Push a reading into the sink of one registration, released or not.
    fn push_to(&self, registration: u64, reading: Reading) {
        let sink = self
            .sinks
            .lock()
            .iter()
            .find(|(id, _)| *id == registration)
            .map(|(_, sink)| Arc::clone(sink));
        if let Some(sink) = sink {
            sink.on_reading(reading);
        }
    }

    /// Push a reading tagged with the registration id into every sink ever seen.
    fn push_to_all(&self, timestamp_ns: i64) {
        let sinks: Vec<(u64, ReadingSink)> = self.sinks.lock().clone();
        for (id, sink) in sinks {
            sink.on_reading(Reading::new(timestamp_ns, vec![id as f32, 0.0, 0.0], 3));
        }
    }
}

impl SensorSource for RetainingSource {
    fn register(
        &self,
        device: DeviceId,
        _rate: SamplingRate,
        sink: ReadingSink,
    ) -> AppResult<RegistrationHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sinks.lock().push((id, sink));
        Ok(RegistrationHandle::new(id, device))
    }

    fn unregister(&self, _handle: RegistrationHandle) {
        self.unregistered.fetch_add(1, Ordering::SeqCst);
    }
}

async fn wait_received(controller: &StreamController, at_least: u64) {
    let mut counters = controller.counters().subscribe();
    tokio::time::timeout(
        Duration::from_secs(2),
        counters.wait_for(|c| c.received >= at_least),
    )
    .await
    .expect("reading was not consumed")
    .unwrap();
}

#[tokio::test]
async fn test_released_sink_cannot_touch_state() {
    let source = Arc::new(RetainingSource::default());
    let mut controller = StreamController::new(source.clone(), 10);

    controller.start(DEVICE, SamplingRate::Ui).await.unwrap();
    let first = source.latest_id();
    source.push_to(first, Reading::new(1, vec![1.0, 2.0, 3.0], 3));
    wait_received(&controller, 1).await;

    controller.stop().await;
    assert_eq!(source.unregistered.load(Ordering::SeqCst), 1);

    let history = controller.history().get();
    let stats = controller.statistics().get();
    let current = controller.current().get();
    let counters = controller.counters().get();

    source.push_to(first, Reading::new(2, vec![9.0, 9.0, 9.0], 3));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(controller.history().get(), history);
    assert_eq!(controller.statistics().get(), stats);
    assert_eq!(controller.current().get(), current);
    assert_eq!(controller.counters().get(), counters);

    // A fresh subscription must not revive the released one.
    controller.start(DEVICE, SamplingRate::Ui).await.unwrap();
    let second = source.latest_id();
    assert_ne!(first, second);
    source.push_to(first, Reading::new(3, vec![8.0, 8.0, 8.0], 3));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(controller.history().get(), history);
    assert_eq!(controller.counters().get().received, counters.received);

    source.push_to(second, Reading::new(4, vec![4.0, 5.0, 6.0], 3));
    wait_received(&controller, counters.received + 1).await;
    assert_eq!(controller.history().get().axis(0), &[1.0, 4.0]);
    assert_eq!(controller.current().get().unwrap().timestamp_ns(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_rate_keeps_no_reading_from_previous_rate() {
    let source = Arc::new(RetainingSource::default());
    let mut controller = StreamController::new(source.clone(), 1000);
    controller.start(DEVICE, SamplingRate::Normal).await.unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let feeder = {
        let source = Arc::clone(&source);
        let running = Arc::clone(&running);
        std::thread::spawn(move || {
            let mut ts = 0i64;
            while running.load(Ordering::Relaxed) {
                source.push_to_all(ts);
                ts += 1;
            }
        })
    };

    for round in 0..300 {
        let rate = if round % 2 == 0 {
            SamplingRate::Game
        } else {
            SamplingRate::Ui
        };
        controller.set_rate(rate).await.unwrap();
        let current = source.latest_id() as f32;
        let history = controller.history().get();
        assert!(
            history.axis(0).iter().all(|v| *v == current),
            "round {round}: history holds readings from an earlier registration: {:?}",
            history.axis(0)
        );
        let stats = controller.statistics().get().axis(0);
        assert!(stats.is_empty() || stats.min() == Some(current));
    }

    running.store(false, Ordering::Relaxed);
    feeder.join().unwrap();
    controller.stop().await;
}
