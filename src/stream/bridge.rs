//! Callback-to-stream bridge.
//!
//! Turns a push-based `SensorSource` registration into a single-consumer,
//! cancellable `Stream<Item = Reading>`.
//!
//! # State machine
//!
//! ```text
//!            on_reading()              poll_next()
//!  Empty ─────────────────> Pending ─────────────────> Empty
//!    │                        │  on_reading(): replace (latest wins)
//!    │ cancel()/drop          │ cancel()/drop: discard
//!    v                        v
//!  Closed <───────────────────┘
//! ```
//!
//! The slot holds at most one undelivered reading. The source never blocks and
//! never builds a backlog: a reading that arrives before the previous one was
//! consumed replaces it.
//!
//! Cancellation unregisters from the source exactly once, before `cancel`
//! returns, on every exit path (explicit cancel, canceller handle, drop).

use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::error::AppResult;
use crate::hardware::capabilities::{ReadingListener, RegistrationHandle, SensorSource};
use crate::hardware::descriptor::{DeviceId, SamplingRate};
use crate::measurement_types::Reading;

#[derive(Default)]
struct SlotState {
    pending: Option<Reading>,
    closed: bool,
    waker: Option<Waker>,
    superseded: u64,
}

/// Single-slot "latest pending value" shared with the source.
#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
}

impl Slot {
    fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Option<Reading>> {
        let mut state = self.state.lock();
        if let Some(reading) = state.pending.take() {
            return Poll::Ready(Some(reading));
        }
        if state.closed {
            return Poll::Ready(None);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Close the slot, optionally discarding an undelivered reading.
    fn close(&self, discard_pending: bool) {
        let waker = {
            let mut state = self.state.lock();
            state.closed = true;
            if discard_pending {
                state.pending = None;
            }
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn superseded(&self) -> u64 {
        self.state.lock().superseded
    }
}

impl ReadingListener for Slot {
    fn on_reading(&self, reading: Reading) {
        let waker = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            if state.pending.replace(reading).is_some() {
                state.superseded += 1;
            }
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn on_closed(&self) {
        // Source-side end: let the consumer drain what is already pending.
        self.close(false);
    }
}

/// One live registration: the slot plus what is needed to release it.
struct Registration {
    slot: Arc<Slot>,
    source: Arc<dyn SensorSource>,
    handle: Mutex<Option<RegistrationHandle>>,
    device: DeviceId,
    rate: SamplingRate,
}

impl Registration {
    fn cancel(&self) -> bool {
        self.slot.close(true);
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => {
                tracing::debug!(
                    device = self.device,
                    registration = handle.id(),
                    "unregistering listener"
                );
                self.source.unregister(handle);
                true
            }
            None => false,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.handle.lock().is_none()
    }
}

/// Opens reading streams against one `SensorSource`.
#[derive(Clone)]
pub struct StreamBridge {
    source: Arc<dyn SensorSource>,
}

impl StreamBridge {
    /// Create a bridge over a source.
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        Self { source }
    }

    /// Register with the source and return the live stream.
    ///
    /// # Errors
    /// Propagates `DeviceUnavailable` / `RegistrationFailure` from the source. On
    /// error nothing is left registered.
    pub fn open(&self, device: DeviceId, rate: SamplingRate) -> AppResult<ReadingStream> {
        let slot = Arc::new(Slot::default());
        let handle = self
            .source
            .register(device, rate, slot.clone())
            .inspect_err(|e| {
                tracing::warn!(device, ?rate, error = %e, "stream open failed");
            })?;

        tracing::debug!(device, ?rate, registration = handle.id(), "stream opened");

        Ok(ReadingStream {
            registration: Arc::new(Registration {
                slot,
                source: Arc::clone(&self.source),
                handle: Mutex::new(Some(handle)),
                device,
                rate,
            }),
        })
    }
}

/// Live, single-consumer sequence of readings.
///
/// Yields readings in production order, skipping any that were superseded
/// before the consumer polled. Ends when cancelled or when the source closes the
/// registration. Dropping the stream cancels it.
pub struct ReadingStream {
    registration: Arc<Registration>,
}

impl ReadingStream {
    /// Device this stream reads from.
    pub fn device(&self) -> DeviceId {
        self.registration.device
    }

    /// Rate requested at open time.
    pub fn rate(&self) -> SamplingRate {
        self.registration.rate
    }

    /// Number of readings replaced in the slot before they were consumed.
    pub fn superseded(&self) -> u64 {
        self.registration.slot.superseded()
    }

    /// Whether the registration has been released.
    pub fn is_cancelled(&self) -> bool {
        self.registration.is_cancelled()
    }

    /// Handle that can cancel this stream from elsewhere (e.g. a controller while
    /// the stream is owned by a consumer task).
    pub fn canceller(&self) -> StreamCanceller {
        StreamCanceller {
            registration: Arc::clone(&self.registration),
        }
    }

    /// Cancel the stream and unregister from the source.
    ///
    /// # Returns
    /// true if this call released the registration, false if already released
    pub fn cancel(&mut self) -> bool {
        self.registration.cancel()
    }
}

impl Stream for ReadingStream {
    type Item = Reading;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.registration.slot.poll_take(cx)
    }
}

impl Drop for ReadingStream {
    fn drop(&mut self) {
        self.registration.cancel();
    }
}

impl std::fmt::Debug for ReadingStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingStream")
            .field("device", &self.registration.device)
            .field("rate", &self.registration.rate)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Detached cancellation handle for a `ReadingStream`.
#[derive(Clone)]
pub struct StreamCanceller {
    registration: Arc<Registration>,
}

impl StreamCanceller {
    /// Cancel the stream. Unregistration has completed when this returns.
    ///
    /// # Returns
    /// true if this call released the registration
    pub fn cancel(&self) -> bool {
        self.registration.cancel()
    }

    /// Whether the registration has been released.
    pub fn is_cancelled(&self) -> bool {
        self.registration.is_cancelled()
    }
}
