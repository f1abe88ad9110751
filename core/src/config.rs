//! config.rs
//! Per-stream configuration for `ChainedSliceStream`.

use serde::{Deserialize, Serialize};

use crate::types::StreamError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceStreamConfig {
    /// Whether `mark()`/`reset()` are honoured.
    /// - `true` (default) → slices are re-opened on reset, so the factory must
    ///   return identical bytes for the same index every time.
    /// - `false` → `mark()` is a no-op and `reset()` always fails.
    pub mark_supported: bool,

    /// Whether per-stage durations are recorded into telemetry.
    pub collect_timings: bool,
}

impl Default for SliceStreamConfig {
    fn default() -> Self {
        Self {
            mark_supported: true,
            collect_timings: true,
        }
    }
}

impl SliceStreamConfig {
    pub fn new(mark_supported: Option<bool>, collect_timings: Option<bool>) -> Self {
        let defaults = Self::default();
        Self {
            mark_supported: mark_supported.unwrap_or(defaults.mark_supported),
            collect_timings: collect_timings.unwrap_or(defaults.collect_timings),
        }
    }

    /// Config for factories whose re-open is not idempotent.
    pub fn without_mark() -> Self {
        Self {
            mark_supported: false,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields fall back to defaults.
    pub fn from_json(raw: &str) -> Result<Self, StreamError> {
        Ok(serde_json::from_str(raw)?)
    }
}
