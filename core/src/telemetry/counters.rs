//! telemetry/counters.rs
//! Mutable counters collected while a chained slice stream is read.
//!
//! Summary: Tracks slice lifecycle (open/reopen/close) and byte flow.
//! Converted into an immutable `TelemetrySnapshot` on demand.

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceCounters {
    pub slices_opened: u64,
    pub slices_reopened: u64,
    pub slices_closed: u64,
    pub close_failures: u64,
    pub bytes_read: u64,
    pub bytes_skipped: u64,
    pub bytes_restored: u64,
    pub marks: u64,
    pub resets: u64,
}

impl SliceCounters {
    /// Record a factory open.
    /// - `reopen`: the index had already been served earlier (mark/reset).
    pub fn add_open(&mut self, reopen: bool) {
        self.slices_opened += 1;
        if reopen {
            self.slices_reopened += 1;
        }
    }

    /// Record a slice release; `failed` when the slice's own close errored.
    pub fn add_close(&mut self, failed: bool) {
        self.slices_closed += 1;
        if failed {
            self.close_failures += 1;
        }
    }

    pub fn add_read(&mut self, n: usize) {
        self.bytes_read += n as u64;
    }

    pub fn add_skip(&mut self, n: u64) {
        self.bytes_skipped += n;
    }

    /// Bytes thrown away while re-positioning a re-opened slice at its mark.
    pub fn add_restore(&mut self, n: u64) {
        self.bytes_restored += n;
    }

    pub fn add_mark(&mut self) {
        self.marks += 1;
    }

    pub fn add_reset(&mut self) {
        self.resets += 1;
    }

    /// Bytes handed to the caller or skipped on its behalf.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_read + self.bytes_skipped
    }
}
