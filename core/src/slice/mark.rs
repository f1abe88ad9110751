use serde::{Deserialize, Serialize};

/// A checkpoint inside a chained slice stream.
///
/// Restoring it re-opens slice `index` and skips `offset` bytes; nothing read
/// since the mark is buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Slice the cursor was on (equal to the slice count once exhausted).
    pub index: usize,
    /// Bytes already consumed from that slice.
    pub offset: u64,
    /// Global stream position at the mark.
    pub position: u64,
}
