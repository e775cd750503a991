//! Per-device data retained between readings: rolling history and session statistics.
pub mod history;
pub mod statistics;

pub use history::{HistoryBuffer, HistorySnapshot, DEFAULT_HISTORY_CAPACITY};
pub use statistics::{RunningStats, StatisticsAccumulator, StatsSnapshot};
