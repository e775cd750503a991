//! Observable State
//!
//! Published, read-only state using `tokio::sync::watch` for multi-subscriber
//! notifications. The controller is the only writer; presentation layers either
//! pull the current value with `get()` or await changes on a receiver from
//! `subscribe()`.
//!
//! Every value handed out is a clone. Nothing outside the controller ever holds a
//! reference into state that is being mutated.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut rx = controller.state().subscribe();
//! tokio::spawn(async move {
//!     while rx.changed().await.is_ok() {
//!         println!("Subscription is now {:?}", *rx.borrow());
//!     }
//! });
//! ```

use std::sync::Arc;
use tokio::sync::watch;

/// A thread-safe, observable value with change notifications.
///
/// Cloning an `Observable` shares the underlying channel.
#[derive(Clone)]
pub struct Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    sender: Arc<watch::Sender<T>>,
    name: &'static str,
}

impl<T: Clone + Send + Sync + 'static> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.name)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new observable with an initial value.
    pub fn new(name: &'static str, initial_value: T) -> Self {
        let (sender, _) = watch::channel(initial_value);
        Self {
            sender: Arc::new(sender),
            name,
        }
    }

    /// Get the current value (clone).
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Name of the published value.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replace the value, notifying all subscribers.
    pub(crate) fn publish(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Subscribe to value changes.
    ///
    /// ```rust,ignore
    /// let mut rx = observable.subscribe();
    /// while rx.changed().await.is_ok() {
    ///     let value = rx.borrow().clone();
    /// }
    /// ```
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observable_basic() {
        let obs = Observable::new("test", 42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.name(), "test");

        obs.publish(100);
        assert_eq!(obs.get(), 100);
    }

    #[test]
    fn test_get_returns_copy() {
        let obs = Observable::new("history", vec![1.0f32]);
        let mut copy = obs.get();
        copy.push(2.0);
        assert_eq!(obs.get(), vec![1.0]);
    }

    #[tokio::test]
    async fn test_observable_subscription() {
        let obs = Observable::new("value", 0);
        let mut rx = obs.subscribe();
        assert_eq!(obs.subscriber_count(), 1);

        assert_eq!(*rx.borrow(), 0);

        obs.publish(42);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 42);
    }
}
