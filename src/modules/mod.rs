//! Stream control and published state.
//!
//! A `StreamController` owns one device's subscription and the history and
//! statistics derived from it. Everything it exposes goes through
//! `Observable`, so readers only ever get copies.

pub mod controller;
pub mod observable;

pub use controller::{SessionCounters, StreamController, SubscriptionState, TRACKED_AXES};
pub use observable::Observable;
