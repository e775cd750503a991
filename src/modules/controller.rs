//! Stream controller for one monitored device.
//!
//! `StreamController` owns one subscription at a time, gates delivery while
//! paused and folds accepted readings into a `HistoryBuffer` and a
//! `StatisticsAccumulator`. Presentation layers only see published copies
//! through `Observable` values.
//!
//! # Lifecycle
//!
//! ```text
//!              start()                 pause()
//!  Stopped ─────────────> Active ────────────────> Paused
//!     ^                    │  ^ <──────────────────  │
//!     │      stop() /      │  │       resume()       │
//!     │   source closed    │  └── start()/set_rate() ┘
//!     └────────────────────┴──────────── stop() ─────┘
//! ```
//!
//! # Ordering
//!
//! A consumer task drains the `ReadingStream`. Every reading is applied under
//! the session lock, tagged with the epoch of the subscription it came from.
//! `start`, `set_rate` and `stop` bump the epoch under the same lock before
//! releasing the old registration, so once they return no reading from the old
//! subscription can touch the published state. A reading already applied before
//! a transition is never retroactively removed.

use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::data::history::{HistoryBuffer, HistorySnapshot, DEFAULT_HISTORY_CAPACITY};
use crate::data::statistics::{StatisticsAccumulator, StatsSnapshot};
use crate::error::AppResult;
use crate::hardware::capabilities::SensorSource;
use crate::hardware::descriptor::{DeviceId, SamplingRate};
use crate::measurement_types::Reading;
use crate::modules::observable::Observable;
use crate::stream::bridge::{ReadingStream, StreamBridge, StreamCanceller};

/// Number of leading axes folded into history and statistics.
pub const TRACKED_AXES: usize = 3;

/// Lifecycle of one device's live data feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    /// No registration with the source
    #[default]
    Stopped,
    /// Readings are applied to history and statistics
    Active,
    /// Registration kept, readings discarded
    Paused,
}

/// Delivery counters for the current controller.
///
/// `received == applied + discarded` holds for every published value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    /// Readings that reached the consumer task
    pub received: u64,
    /// Readings folded into history and statistics
    pub applied: u64,
    /// Readings dropped by the pause gate
    pub discarded: u64,
}

struct Session {
    epoch: u64,
    state: SubscriptionState,
    device: Option<DeviceId>,
    rate: SamplingRate,
    history: HistoryBuffer<f32>,
    stats: StatisticsAccumulator,
    counters: SessionCounters,
    canceller: Option<StreamCanceller>,
}

struct Published {
    current: Observable<Option<Reading>>,
    history: Observable<HistorySnapshot>,
    statistics: Observable<StatsSnapshot>,
    state: Observable<SubscriptionState>,
    counters: Observable<SessionCounters>,
}

struct Shared {
    session: Mutex<Session>,
    published: Published,
}

impl Shared {
    /// Apply one reading from the subscription tagged `epoch`.
    ///
    /// # Returns
    /// false once the subscription is stale and the consumer should exit
    fn apply(&self, epoch: u64, reading: Reading) -> bool {
        let mut session = self.session.lock();
        if session.epoch != epoch {
            return false;
        }
        session.counters.received += 1;
        match session.state {
            SubscriptionState::Active => {
                for (axis, value) in reading.values().iter().take(TRACKED_AXES).enumerate() {
                    session.history.push(axis, *value);
                    session.stats.observe(axis, *value);
                }
                session.counters.applied += 1;
                tracing::trace!(
                    timestamp_ns = reading.timestamp_ns(),
                    values = ?reading.values(),
                    "reading applied"
                );
                self.published.history.publish(session.history.snapshot_all());
                self.published.statistics.publish(session.stats.snapshot());
                self.published.current.publish(Some(reading));
            }
            SubscriptionState::Paused => {
                session.counters.discarded += 1;
                tracing::trace!(timestamp_ns = reading.timestamp_ns(), "reading discarded while paused");
            }
            SubscriptionState::Stopped => return false,
        }
        self.published.counters.publish(session.counters);
        true
    }

    /// Stream for `epoch` ended on its own.
    fn finish(&self, epoch: u64) {
        let mut session = self.session.lock();
        if session.epoch != epoch || session.state == SubscriptionState::Stopped {
            return;
        }
        session.epoch += 1;
        session.canceller = None;
        session.state = SubscriptionState::Stopped;
        self.published.state.publish(SubscriptionState::Stopped);
        tracing::warn!(device = ?session.device, "source terminated the stream; monitoring stopped");
    }

    fn clear(&self, session: &mut Session) {
        session.history.clear();
        session.stats.reset();
        self.published.history.publish(session.history.snapshot_all());
        self.published.statistics.publish(session.stats.snapshot());
    }

    fn set_state(&self, session: &mut Session, state: SubscriptionState) {
        if session.state != state {
            tracing::info!(device = ?session.device, from = ?session.state, to = ?state, "subscription state changed");
        }
        session.state = state;
        self.published.state.publish(state);
    }
}

/// Orchestrates one live subscription and its derived state.
///
/// Requires a tokio runtime for `start` and `set_rate` (the consumer task is
/// spawned on the current runtime). Dropping the controller releases the
/// registration synchronously.
///
/// # Example
///
/// ```rust,ignore
/// let mut controller = StreamController::new(source, 50);
/// controller.start(1, SamplingRate::Ui).await?;
/// controller.pause();
/// controller.resume();
/// controller.set_rate(SamplingRate::Game).await?;
/// controller.stop().await;
/// ```
pub struct StreamController {
    bridge: StreamBridge,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl StreamController {
    /// Create a stopped controller over a source.
    pub fn new(source: Arc<dyn SensorSource>, history_capacity: usize) -> Self {
        let history = HistoryBuffer::new(history_capacity, TRACKED_AXES);
        let stats = StatisticsAccumulator::new(TRACKED_AXES);
        let published = Published {
            current: Observable::new("current_reading", None),
            history: Observable::new("history", history.snapshot_all()),
            statistics: Observable::new("statistics", stats.snapshot()),
            state: Observable::new("subscription_state", SubscriptionState::Stopped),
            counters: Observable::new("session_counters", SessionCounters::default()),
        };
        Self {
            bridge: StreamBridge::new(source),
            shared: Arc::new(Shared {
                session: Mutex::new(Session {
                    epoch: 0,
                    state: SubscriptionState::Stopped,
                    device: None,
                    rate: SamplingRate::default(),
                    history,
                    stats,
                    counters: SessionCounters::default(),
                    canceller: None,
                }),
                published,
            }),
            task: None,
        }
    }

    /// Controller with the default history capacity.
    pub fn with_default_capacity(source: Arc<dyn SensorSource>) -> Self {
        Self::new(source, DEFAULT_HISTORY_CAPACITY)
    }

    /// Start (or restart) monitoring `device` at `rate`.
    ///
    /// Any prior subscription is released first. History and statistics are kept
    /// unless the device differs from the one previously monitored.
    ///
    /// # Errors
    /// `DeviceUnavailable` or `RegistrationFailure` from the source. The
    /// controller is left `Stopped` with nothing registered.
    pub async fn start(&mut self, device: DeviceId, rate: SamplingRate) -> AppResult<()> {
        self.restart(device, rate, false).await
    }

    /// Change the sampling rate.
    ///
    /// Always clears history and statistics. Restarts the subscription on the
    /// last monitored device; with no device yet the rate is stored for the
    /// next `start`.
    ///
    /// # Errors
    /// Same as `start`.
    pub async fn set_rate(&mut self, rate: SamplingRate) -> AppResult<()> {
        let device = self.shared.session.lock().device;
        tracing::info!(?rate, ?device, "sampling rate changed");
        match device {
            Some(device) => self.restart(device, rate, true).await,
            None => {
                let mut session = self.shared.session.lock();
                self.shared.clear(&mut session);
                session.rate = rate;
                Ok(())
            }
        }
    }

    /// Release the current subscription, optionally clearing, then open a new one.
    ///
    /// The clear happens in the same critical section as the epoch bump, so the
    /// old consumer cannot refill the cleared buffers.
    async fn restart(&mut self, device: DeviceId, rate: SamplingRate, clear: bool) -> AppResult<()> {
        self.detach(clear.then_some(rate));
        self.join_consumer().await;

        let stream = match self.bridge.open(device, rate) {
            Ok(stream) => stream,
            Err(e) => {
                let mut session = self.shared.session.lock();
                self.shared.set_state(&mut session, SubscriptionState::Stopped);
                return Err(e);
            }
        };

        let epoch = {
            let mut session = self.shared.session.lock();
            if session.device.is_some_and(|previous| previous != device) {
                self.shared.clear(&mut session);
                self.shared.published.current.publish(None);
            }
            session.device = Some(device);
            session.rate = rate;
            session.canceller = Some(stream.canceller());
            self.shared.set_state(&mut session, SubscriptionState::Active);
            session.epoch
        };

        let span = tracing::info_span!("consumer", device, ?rate, epoch);
        self.task = Some(tokio::spawn(
            consume(Arc::clone(&self.shared), stream, epoch).instrument(span),
        ));
        Ok(())
    }

    /// Gate delivery without releasing the registration. No-op unless `Active`.
    pub fn pause(&self) {
        let mut session = self.shared.session.lock();
        if session.state == SubscriptionState::Active {
            self.shared.set_state(&mut session, SubscriptionState::Paused);
        } else {
            tracing::debug!(state = ?session.state, "pause ignored");
        }
    }

    /// Reopen the gate. No-op unless `Paused`.
    pub fn resume(&self) {
        let mut session = self.shared.session.lock();
        if session.state == SubscriptionState::Paused {
            self.shared.set_state(&mut session, SubscriptionState::Active);
        } else {
            tracing::debug!(state = ?session.state, "resume ignored");
        }
    }

    /// Pause when `Active`, resume when `Paused`.
    ///
    /// # Returns
    /// State after the call
    pub fn toggle_pause(&self) -> SubscriptionState {
        let mut session = self.shared.session.lock();
        match session.state {
            SubscriptionState::Active => {
                self.shared.set_state(&mut session, SubscriptionState::Paused)
            }
            SubscriptionState::Paused => {
                self.shared.set_state(&mut session, SubscriptionState::Active)
            }
            SubscriptionState::Stopped => {}
        }
        session.state
    }

    /// Reset history and statistics. Subscription state is unchanged.
    pub fn clear_history(&self) {
        let mut session = self.shared.session.lock();
        self.shared.clear(&mut session);
        tracing::debug!(device = ?session.device, "history cleared");
    }

    /// Release the subscription. Unregistration has completed on return.
    pub async fn stop(&mut self) {
        self.release().await;
        let mut session = self.shared.session.lock();
        self.shared.set_state(&mut session, SubscriptionState::Stopped);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SubscriptionState {
        self.shared.session.lock().state
    }

    /// Last monitored device, if any.
    pub fn device(&self) -> Option<DeviceId> {
        self.shared.session.lock().device
    }

    /// Rate of the current (or next) subscription.
    pub fn rate(&self) -> SamplingRate {
        self.shared.session.lock().rate
    }

    /// Most recent applied reading.
    pub fn current(&self) -> &Observable<Option<Reading>> {
        &self.shared.published.current
    }

    /// Per-axis history windows.
    pub fn history(&self) -> &Observable<HistorySnapshot> {
        &self.shared.published.history
    }

    /// Per-axis running statistics.
    pub fn statistics(&self) -> &Observable<StatsSnapshot> {
        &self.shared.published.statistics
    }

    /// Lifecycle state, for pause/resume UI.
    pub fn subscription_state(&self) -> &Observable<SubscriptionState> {
        &self.shared.published.state
    }

    /// Delivery counters.
    pub fn counters(&self) -> &Observable<SessionCounters> {
        &self.shared.published.counters
    }

    /// Invalidate the current subscription and wait for its consumer to exit.
    async fn release(&mut self) {
        self.detach(None);
        self.join_consumer().await;
    }

    async fn join_consumer(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "consumer task panicked");
                }
            }
        }
    }

    /// Bump the epoch, then unregister.
    ///
    /// With `reset_to`, history and statistics are cleared and the rate stored
    /// under the same lock as the epoch bump.
    fn detach(&self, reset_to: Option<SamplingRate>) {
        let canceller = {
            let mut session = self.shared.session.lock();
            session.epoch += 1;
            if let Some(rate) = reset_to {
                self.shared.clear(&mut session);
                session.rate = rate;
            }
            session.canceller.take()
        };
        if let Some(canceller) = canceller {
            canceller.cancel();
        }
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.detach(None);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for StreamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.shared.session.lock();
        f.debug_struct("StreamController")
            .field("state", &session.state)
            .field("device", &session.device)
            .field("rate", &session.rate)
            .field("epoch", &session.epoch)
            .finish()
    }
}

async fn consume(shared: Arc<Shared>, mut stream: ReadingStream, epoch: u64) {
    while let Some(reading) = stream.next().await {
        if !shared.apply(epoch, reading) {
            return;
        }
    }
    shared.finish(epoch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::hardware::mock::{default_devices, SimulatedSensorSource};
    use crate::hardware::registry::DeviceRegistry;
    use std::time::Duration;
    use tracing_test::traced_test;

    const ACCEL: DeviceId = 1;

    fn setup(capacity: usize) -> (Arc<SimulatedSensorSource>, StreamController) {
        let registry = Arc::new(DeviceRegistry::with_devices(default_devices()).unwrap());
        let source = Arc::new(SimulatedSensorSource::manual(registry));
        let controller = StreamController::new(source.clone(), capacity);
        (source, controller)
    }

    /// Emit one reading and wait until the consumer has taken it.
    async fn deliver(source: &SimulatedSensorSource, controller: &StreamController, reading: Reading) {
        let mut rx = controller.counters().subscribe();
        let before = rx.borrow().received;
        source.emit(ACCEL, reading);
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|c| c.received > before))
            .await
            .expect("reading not consumed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_window_and_statistics() {
        let (source, mut controller) = setup(3);
        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        for (i, v) in [1.0, 2.0, 3.0, 4.0].into_iter().enumerate() {
            deliver(&source, &controller, Reading::new(i as i64, vec![v, 0.0, 0.0], 3)).await;
        }
        assert_eq!(controller.history().get().axis(0), &[2.0, 3.0, 4.0]);
        let stats = controller.statistics().get().axis(0);
        assert_eq!(stats.min(), Some(1.0));
        assert_eq!(stats.max(), Some(4.0));
        assert!((stats.average() - 2.5).abs() < 1e-9);
        assert_eq!(controller.current().get().unwrap().timestamp_ns(), 3);
    }

    #[tokio::test]
    async fn test_pause_and_resume_state_machine() {
        let (_source, mut controller) = setup(5);
        controller.pause();
        assert_eq!(controller.state(), SubscriptionState::Stopped);

        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        controller.resume();
        assert_eq!(controller.state(), SubscriptionState::Active);
        controller.pause();
        assert_eq!(controller.subscription_state().get(), SubscriptionState::Paused);
        assert_eq!(controller.toggle_pause(), SubscriptionState::Active);
        assert_eq!(controller.toggle_pause(), SubscriptionState::Paused);

        controller.stop().await;
        assert_eq!(controller.toggle_pause(), SubscriptionState::Stopped);
    }

    #[tokio::test]
    async fn test_start_failure_leaves_stopped() {
        let (source, mut controller) = setup(5);
        let err = controller.start(99, SamplingRate::Ui).await.unwrap_err();
        assert!(matches!(err, SensorError::DeviceUnavailable(99)));
        assert_eq!(controller.state(), SubscriptionState::Stopped);
        assert_eq!(source.active_registrations(99), 0);
    }

    #[tokio::test]
    async fn test_restart_releases_previous_registration() {
        let (source, mut controller) = setup(5);
        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        controller.start(ACCEL, SamplingRate::Game).await.unwrap();
        assert_eq!(source.active_registrations(ACCEL), 1);
        assert_eq!(source.unregistration_count(), 1);
        assert_eq!(controller.rate(), SamplingRate::Game);
    }

    #[tokio::test]
    async fn test_set_rate_before_start_only_stores_rate() {
        let (source, mut controller) = setup(5);
        controller.set_rate(SamplingRate::Fastest).await.unwrap();
        assert_eq!(controller.state(), SubscriptionState::Stopped);
        assert_eq!(controller.rate(), SamplingRate::Fastest);
        assert_eq!(source.registration_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let (source, mut controller) = setup(5);
        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        drop(controller);
        assert_eq!(source.active_registrations(ACCEL), 0);
        assert_eq!(source.unregistration_count(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_source_termination_stops_controller() {
        let (source, mut controller) = setup(5);
        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        let mut rx = controller.subscription_state().subscribe();
        source.terminate(ACCEL);
        tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| *s == SubscriptionState::Stopped),
        )
        .await
        .expect("controller did not stop")
        .unwrap();
        assert_eq!(controller.state(), SubscriptionState::Stopped);
        assert!(logs_contain("source terminated the stream"));

        // Recovery path is a fresh start.
        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        assert_eq!(controller.state(), SubscriptionState::Active);
    }

    #[tokio::test]
    async fn test_switching_device_clears_session() {
        let (source, mut controller) = setup(5);
        controller.start(ACCEL, SamplingRate::Ui).await.unwrap();
        deliver(&source, &controller, Reading::new(1, vec![1.0, 2.0, 3.0], 3)).await;

        controller.start(4, SamplingRate::Ui).await.unwrap();
        assert!(controller.history().get().is_empty());
        assert!(controller.statistics().get().is_empty());
        assert!(controller.current().get().is_none());
        assert_eq!(controller.device(), Some(4));
    }
}
