//! Stream plumbing between push-based sources and the controller.

pub mod bridge;

pub use bridge::{ReadingStream, StreamBridge, StreamCanceller};
