//! types.rs
//! Error types shared by every layer of the crate.
//!
//! - `StreamError`: slice I/O failures, rejected resets, truncated restores
//!   and configuration errors
//! - `ResetRejection`: why a `reset()` was refused

use std::fmt;
use std::io;

/// Why a `reset()` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRejection {
    /// `mark()` was never called (or the mark was invalidated).
    NoMark,
    /// Mark/reset is disabled for this stream.
    Unsupported,
    /// The stream has been closed.
    Closed,
}

impl fmt::Display for ResetRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ResetRejection::NoMark => "no mark set",
            ResetRejection::Unsupported => "mark/reset not supported",
            ResetRejection::Closed => "stream closed",
        };
        f.write_str(msg)
    }
}

/// Unified stream error covering slice I/O, reset misuse and configuration.
/// - `From<io::Error>` lets `?` lift factory and slice failures.
/// - `From<StreamError> for io::Error` hands the original `io::Error` back
///   unchanged, so the `Read` impl never rewraps slice failures.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Opening or reading a slice failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `reset()` called without a usable mark.
    #[error("invalid reset: {0}")]
    InvalidReset(ResetRejection),

    /// A re-opened slice ended before the marked offset could be restored.
    #[error("slice {index} ended after {actual} bytes while restoring mark at offset {expected}")]
    MarkedSliceTruncated {
        index: usize,
        expected: u64,
        actual: u64,
    },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl StreamError {
    pub fn is_invalid_reset(&self) -> bool {
        matches!(self, StreamError::InvalidReset(_))
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(inner) => inner,
            StreamError::MarkedSliceTruncated { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, e)
            }
            StreamError::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            StreamError::InvalidReset(_) => io::Error::other(e),
        }
    }
}
