//! slice/chained.rs
//! `ChainedSliceStream`: N independently opened slices read as one stream.
//!
//! Summary:
//! - At most one slice is held. It is opened on first need and closed as
//!   soon as it reports EOF, before the next index is opened.
//! - `mark()` records (slice index, offset in slice). `reset()` re-opens that
//!   slice through the factory and skips to the offset; nothing is buffered.
//! - `close()` is terminal and infallible. Reads after it return EOF.
//!
//! Not thread-safe by construction: every operation takes `&mut self`.

use std::fmt;
use std::io::{self, Read};
use std::time::Instant;

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::config::SliceStreamConfig;
use crate::constants::SCRATCH_BUFFER_SIZE;
use crate::slice::factory::SliceFactory;
use crate::slice::mark::Mark;
use crate::slice::source::{skip_fully, SliceRead};
use crate::telemetry::{SliceCounters, Stage, TelemetrySnapshot, TelemetryTimer};
use crate::types::{ResetRejection, StreamError};
use crate::utils::read_retrying;

struct OpenSlice<S> {
    index: usize,
    stream: S,
    /// Bytes consumed from this slice, including any restored mark offset.
    consumed: u64,
}

pub struct ChainedSliceStream<F: SliceFactory> {
    factory: F,
    slice_count: usize,
    config: SliceStreamConfig,

    // --- cursor ---
    current_index: usize,
    current: Option<OpenSlice<F::Slice>>,
    /// Offset the next open of `current_index` must skip to. Set by `reset()`
    /// and kept until a restore succeeds.
    restore_offset: Option<u64>,
    position: u64,
    /// Failure hit after a partial fill; returned by the next operation.
    deferred: Option<StreamError>,

    mark: Option<Mark>,
    closed: bool,

    /// Highest index handed out by the factory so far.
    highest_opened: Option<usize>,
    counters: SliceCounters,
    timer: TelemetryTimer,
}

impl<F: SliceFactory> ChainedSliceStream<F> {
    pub fn new(slice_count: usize, factory: F) -> Self {
        Self::with_config(slice_count, factory, SliceStreamConfig::default())
    }

    pub fn with_config(slice_count: usize, factory: F, config: SliceStreamConfig) -> Self {
        debug!("chained slice stream over {slice_count} slices ({config:?})");
        Self {
            factory,
            slice_count,
            config,
            current_index: 0,
            current: None,
            restore_offset: None,
            position: 0,
            deferred: None,
            mark: None,
            closed: false,
            highest_opened: None,
            counters: SliceCounters::default(),
            timer: TelemetryTimer::new(),
        }
    }

    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    /// Index of the slice the cursor is on; equals `slice_count()` at EOF.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Bytes read or skipped from the start of the logical stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn mark_supported(&self) -> bool {
        self.config.mark_supported
    }

    pub fn marked(&self) -> Option<Mark> {
        self.mark
    }

    pub fn config(&self) -> &SliceStreamConfig {
        &self.config
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(self.slice_count, &self.counters, &self.timer)
    }

    // ================= Reads =================

    /// Read one byte. `None` at EOF and after close.
    pub fn read_byte(&mut self) -> Result<Option<u8>, StreamError> {
        if self.closed {
            return Ok(None);
        }
        self.take_deferred()?;
        let mut byte = [0u8; 1];
        match self.read_some(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Fill `buf` as far as the remaining slices allow, crossing as many slice
    /// boundaries as needed. Returns 0 only at EOF, after close, or for an
    /// empty `buf`. A failure after some bytes were placed is held back and
    /// returned by the next operation, so no byte is lost.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Ok(0);
        }
        self.take_deferred()?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = match self.read_some(&mut buf[filled..]) {
                Ok(n) => n,
                // Bytes already placed are delivered; the failure waits for
                // the next call.
                Err(e) if filled > 0 => {
                    debug!("read stopped after {filled} bytes: {e}");
                    self.deferred = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            };
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Read up to `len` bytes, fewer only at EOF or before a deferred failure.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, StreamError> {
        let mut out = Vec::with_capacity(len.min(SCRATCH_BUFFER_SIZE));
        let mut chunk = [0u8; SCRATCH_BUFFER_SIZE];
        while out.len() < len {
            let want = (len - out.len()).min(chunk.len());
            let n = match self.read_into(&mut chunk[..want]) {
                Ok(n) => n,
                Err(e) if !out.is_empty() => {
                    self.deferred = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            };
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(Bytes::from(out))
    }

    /// Skip up to `n` bytes, never past EOF. Returns the count skipped.
    pub fn skip(&mut self, n: u64) -> Result<u64, StreamError> {
        if self.closed {
            return Ok(0);
        }
        self.take_deferred()?;
        let mut skipped = 0u64;
        while skipped < n && self.open_current()? {
            let want = n - skipped;
            let started = self.start();
            let mut step = 0u64;
            let result = match self.current.as_mut() {
                Some(slice) => {
                    let result = skip_fully(&mut slice.stream, want, &mut step);
                    slice.consumed += step;
                    result
                }
                None => Ok(()),
            };
            self.record(Stage::Skip, started);

            // Bytes skipped before a failure still moved the slice cursor.
            skipped += step;
            self.position += step;
            self.counters.add_skip(step);
            result?;
            if step < want {
                self.advance();
            }
        }
        Ok(skipped)
    }

    /// Non-blocking estimate from the current slice only (opened if needed).
    /// Unopened slices further on are not counted.
    pub fn available(&mut self) -> Result<u64, StreamError> {
        self.take_deferred()?;
        if !self.open_current()? {
            return Ok(0);
        }
        match self.current.as_mut() {
            Some(slice) => Ok(slice.stream.available()?),
            None => Ok(0),
        }
    }

    // ================= Mark / reset =================

    /// Remember the current position. `_read_limit` exists for `InputStream`
    /// parity and bounds nothing since no bytes are buffered.
    pub fn mark(&mut self, _read_limit: usize) {
        if !self.config.mark_supported || self.closed {
            return;
        }
        let offset = match &self.current {
            Some(slice) => slice.consumed,
            None => self.restore_offset.unwrap_or(0),
        };
        let mark = Mark {
            index: self.current_index,
            offset,
            position: self.position,
        };
        trace!("mark at slice {} offset {} (position {})", mark.index, mark.offset, mark.position);
        self.mark = Some(mark);
        self.counters.add_mark();
    }

    /// Return to the last mark by re-opening its slice and skipping to the
    /// marked offset. The mark stays valid for further resets.
    pub fn reset(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::InvalidReset(ResetRejection::Closed));
        }
        if !self.config.mark_supported {
            return Err(StreamError::InvalidReset(ResetRejection::Unsupported));
        }
        let mark = self
            .mark
            .ok_or(StreamError::InvalidReset(ResetRejection::NoMark))?;

        trace!("reset to slice {} offset {} (position {})", mark.index, mark.offset, mark.position);
        self.release_current();
        self.deferred = None;
        self.current_index = mark.index;
        self.restore_offset = (mark.offset > 0).then_some(mark.offset);
        self.position = mark.position;
        self.counters.add_reset();

        self.open_current()?;
        Ok(())
    }

    // ================= Close =================

    /// Release the held slice and end the stream. Idempotent and infallible:
    /// a failing slice close is logged and counted, never returned.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.release_current();
        self.closed = true;
        self.mark = None;
        self.restore_offset = None;
        self.deferred = None;
        self.timer.finish();
        debug!(
            "chained slice stream closed at position {} ({} slices opened)",
            self.position, self.counters.slices_opened
        );
    }

    // ================= Cursor internals =================

    /// Make sure a slice is held if one remains. `false` means EOF (or closed).
    fn open_current(&mut self) -> Result<bool, StreamError> {
        if self.current.is_some() {
            return Ok(true);
        }
        if self.closed || self.current_index >= self.slice_count {
            return Ok(false);
        }

        let index = self.current_index;
        let started = self.start();
        let mut stream = self.factory.open_slice(index)?;
        self.record(Stage::Open, started);

        let reopen = self.highest_opened.is_some_and(|h| index <= h);
        self.highest_opened = Some(self.highest_opened.map_or(index, |h| h.max(index)));
        self.counters.add_open(reopen);
        debug!("opened slice {}/{}{}", index, self.slice_count, if reopen { " again" } else { "" });

        let offset = self.restore_offset.unwrap_or(0);
        if offset > 0 {
            let started = self.start();
            let mut restored = 0u64;
            if let Err(e) = skip_fully(&mut stream, offset, &mut restored) {
                self.release(index, stream);
                return Err(e.into());
            }
            self.record(Stage::Restore, started);

            if restored < offset {
                self.release(index, stream);
                return Err(StreamError::MarkedSliceTruncated {
                    index,
                    expected: offset,
                    actual: restored,
                });
            }
            self.counters.add_restore(offset);
        }

        self.restore_offset = None;
        self.current = Some(OpenSlice {
            index,
            stream,
            consumed: offset,
        });
        Ok(true)
    }

    /// One read against the held slice, moving past exhausted slices.
    /// Returns 0 once every slice is consumed.
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.open_current()? {
            let started = self.start();
            let n = match self.current.as_mut() {
                Some(slice) => {
                    let n = read_retrying(&mut slice.stream, buf)?;
                    slice.consumed += n as u64;
                    n
                }
                None => 0,
            };
            self.record(Stage::Read, started);

            if n > 0 {
                self.position += n as u64;
                self.counters.add_read(n);
                return Ok(n);
            }
            self.advance();
        }
        Ok(0)
    }

    fn take_deferred(&mut self) -> Result<(), StreamError> {
        match self.deferred.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the exhausted slice and step to the next index.
    fn advance(&mut self) {
        self.release_current();
        self.current_index += 1;
    }

    fn release_current(&mut self) {
        if let Some(OpenSlice { index, stream, .. }) = self.current.take() {
            self.release(index, stream);
        }
    }

    fn release(&mut self, index: usize, mut stream: F::Slice) {
        let started = self.start();
        let result = stream.close();
        drop(stream);
        self.record(Stage::Close, started);

        match &result {
            Ok(()) => debug!("closed slice {}/{}", index, self.slice_count),
            Err(e) => warn!("closing slice {}/{} failed: {}", index, self.slice_count, e),
        }
        self.counters.add_close(result.is_err());
    }

    fn start(&self) -> Option<Instant> {
        self.config.collect_timings.then(Instant::now)
    }

    fn record(&mut self, stage: Stage, started: Option<Instant>) {
        if let Some(t) = started {
            self.timer.add_stage_time(stage, t.elapsed());
        }
    }
}

impl<F: SliceFactory> Read for ChainedSliceStream<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}

impl<F: SliceFactory> Drop for ChainedSliceStream<F> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<F: SliceFactory> fmt::Debug for ChainedSliceStream<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedSliceStream")
            .field("slice_count", &self.slice_count)
            .field("current_index", &self.current_index)
            .field("open", &self.current.as_ref().map(|s| (s.index, s.consumed)))
            .field("position", &self.position)
            .field("mark", &self.mark)
            .field("closed", &self.closed)
            .finish()
    }
}
