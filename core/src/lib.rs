//! slice-core
//!
//! Chained slice streams: a sequence of independently opened byte slices
//! (snapshot blob parts, file ranges, in-memory buffers) read as one stream,
//! with lazy opening, eager release, and mark/reset by re-opening.

#![forbid(unsafe_code)]

// Shared and top level
pub mod config;
pub mod constants;
pub mod types;
pub mod utils;

pub mod telemetry;

// Stream layer
pub mod slice;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::SliceStreamConfig;
    pub use crate::slice::{
        ChainedSliceStream, FileRangeSlices, Mark, MemorySlices, SliceFactory, SliceRead,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{ResetRejection, StreamError};
}
