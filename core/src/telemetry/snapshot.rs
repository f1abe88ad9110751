//! telemetry/snapshot.rs
//!
//! Immutable telemetry snapshot of a slice stream.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::SliceCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub slice_count: usize,
    pub slices_opened: u64,
    pub slices_reopened: u64,
    pub slices_closed: u64,
    pub close_failures: u64,
    pub bytes_read: u64,
    pub bytes_skipped: u64,
    pub bytes_restored: u64,
    pub marks: u64,
    pub resets: u64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(slice_count: usize, counters: &SliceCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_consumed() as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            slice_count,
            slices_opened: counters.slices_opened,
            slices_reopened: counters.slices_reopened,
            slices_closed: counters.slices_closed,
            close_failures: counters.close_failures,
            bytes_read: counters.bytes_read,
            bytes_skipped: counters.bytes_skipped,
            bytes_restored: counters.bytes_restored,
            marks: counters.marks,
            resets: counters.resets,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Slices still held when the snapshot was taken.
    pub fn slices_held(&self) -> u64 {
        self.slices_opened.saturating_sub(self.slices_closed)
    }

    /// Internal invariants:
    /// - never more closes than opens
    /// - at most one slice held at a time
    /// - summed stage time fits inside elapsed time
    pub fn sanity_check(&self) -> bool {
        self.slices_closed <= self.slices_opened
            && self.slices_held() <= 1
            && self.slices_reopened <= self.slices_opened
            && self.stage_times.total() <= self.elapsed
    }
}
