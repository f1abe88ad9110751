//! slice/factory.rs
//! Slice factories: the capability that opens slice `i` of a chained stream.
//!
//! Responsibilities:
//! - Open one slice per call, possibly several times for the same index
//! - Return byte-identical content on every re-open of an index
//!
//! Non-responsibilities:
//! - Retry / backoff (wrap the factory if needed)
//! - Deciding how many slices exist or how long they are

use std::io::{self, Cursor};
use std::ops::Range;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::config::SliceStreamConfig;
use crate::slice::chained::ChainedSliceStream;
use crate::slice::source::{FileSlice, SliceRead};

pub trait SliceFactory {
    type Slice: SliceRead;

    /// Open slice `index` (0-based, below the stream's slice count).
    fn open_slice(&mut self, index: usize) -> io::Result<Self::Slice>;
}

/// Any `FnMut(usize) -> io::Result<S>` is a factory.
impl<F, S> SliceFactory for F
where
    F: FnMut(usize) -> io::Result<S>,
    S: SliceRead,
{
    type Slice = S;

    fn open_slice(&mut self, index: usize) -> io::Result<S> {
        self(index)
    }
}

/// Type-erased factory for callers that mix slice types.
pub type BoxedSliceFactory =
    Box<dyn FnMut(usize) -> io::Result<Box<dyn SliceRead + Send>> + Send>;

fn length_overflow() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "slice lengths overflow")
}

fn out_of_range(index: usize, count: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("slice index {index} out of range (slice count {count})"),
    )
}

// ================= In-memory slices =================

/// Slices held in memory as `Bytes`; every open is a zero-copy cursor.
#[derive(Debug, Clone, Default)]
pub struct MemorySlices {
    slices: Vec<Bytes>,
}

impl MemorySlices {
    pub fn new<I, B>(slices: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            slices: slices.into_iter().map(Into::into).collect(),
        }
    }

    /// Carve `data` into consecutive slices of the given lengths.
    /// The lengths must add up to `data.len()` exactly.
    pub fn from_lengths(data: impl Into<Bytes>, lengths: &[usize]) -> io::Result<Self> {
        let data = data.into();
        let total = lengths
            .iter()
            .try_fold(0usize, |acc, &len| acc.checked_add(len))
            .ok_or_else(length_overflow)?;
        if total != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("slice lengths cover {total} bytes, data has {}", data.len()),
            ));
        }

        let mut off = 0;
        let slices = lengths
            .iter()
            .map(|len| {
                let part = data.slice(off..off + len);
                off += len;
                part
            })
            .collect();
        Ok(Self { slices })
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    pub fn total_len(&self) -> u64 {
        self.slices.iter().map(|s| s.len() as u64).sum()
    }

    pub fn into_stream(self) -> ChainedSliceStream<Self> {
        self.into_stream_with(SliceStreamConfig::default())
    }

    pub fn into_stream_with(self, config: SliceStreamConfig) -> ChainedSliceStream<Self> {
        let count = self.slice_count();
        ChainedSliceStream::with_config(count, self, config)
    }
}

impl SliceFactory for MemorySlices {
    type Slice = Cursor<Bytes>;

    fn open_slice(&mut self, index: usize) -> io::Result<Self::Slice> {
        self.slices
            .get(index)
            .cloned()
            .map(Cursor::new)
            .ok_or_else(|| out_of_range(index, self.slices.len()))
    }
}

// ================= File range slices =================

/// Byte ranges of one local file, each opened through a fresh handle.
#[derive(Debug, Clone)]
pub struct FileRangeSlices {
    path: PathBuf,
    ranges: Vec<Range<u64>>,
}

impl FileRangeSlices {
    pub fn new(path: impl AsRef<Path>, ranges: Vec<Range<u64>>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ranges,
        }
    }

    /// Consecutive parts starting at offset 0, one per length.
    /// Fails with `InvalidInput` if the lengths overflow a file offset.
    pub fn from_part_lengths(path: impl AsRef<Path>, lengths: &[u64]) -> io::Result<Self> {
        let mut start = 0u64;
        let mut ranges = Vec::with_capacity(lengths.len());
        for &len in lengths {
            let end = start.checked_add(len).ok_or_else(length_overflow)?;
            ranges.push(start..end);
            start = end;
        }
        Ok(Self::new(path, ranges))
    }

    pub fn slice_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_stream(self) -> ChainedSliceStream<Self> {
        let count = self.slice_count();
        ChainedSliceStream::new(count, self)
    }
}

impl SliceFactory for FileRangeSlices {
    type Slice = FileSlice;

    fn open_slice(&mut self, index: usize) -> io::Result<Self::Slice> {
        let range = self
            .ranges
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.ranges.len()))?;
        FileSlice::open(&self.path, range)
    }
}
