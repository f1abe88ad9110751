//! Shared constants for slice streams.

/// Scratch buffer used when bytes must be read and thrown away (slices
/// without a native skip) or copied in chunks.
pub const SCRATCH_BUFFER_SIZE: usize = 8 * 1024; // 8 KiB

/// Length of the probe read used to tell a stalled native skip from EOF.
pub const PROBE_LEN: usize = 1;
