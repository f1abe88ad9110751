//! slice/source.rs
//! The contract every slice stream fulfils, plus stock implementations.
//!
//! A slice is a plain `Read` with three extras mirroring what a blob-backed
//! segment can offer: a non-blocking availability estimate, a native skip
//! that may fall short, and an explicit close whose failure is observable.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

use crate::constants::PROBE_LEN;
use crate::utils::{discard, read_retrying};

pub trait SliceRead: Read {
    /// Bytes readable without blocking. May be conservative, never required
    /// to reach the end of the slice.
    fn available(&mut self) -> io::Result<u64> {
        Ok(0)
    }

    /// Skip up to `n` bytes. Returning fewer (even 0) before EOF is allowed.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        discard(self, n)
    }

    /// Release the slice. Called exactly once by the owning stream before the
    /// value is dropped.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Skip up to `n` bytes of `slice`, short only at EOF.
///
/// Uses the native skip and falls back to a one-byte probe read whenever the
/// native skip makes no progress. `done` is advanced as bytes are skipped, so
/// it holds the real progress even when an error is returned.
pub(crate) fn skip_fully<S: SliceRead + ?Sized>(
    slice: &mut S,
    n: u64,
    done: &mut u64,
) -> io::Result<()> {
    let target = *done + n;
    while *done < target {
        let want = target - *done;
        let step = slice.skip(want)?.min(want);
        if step > 0 {
            *done += step;
            continue;
        }
        let mut probe = [0u8; PROBE_LEN];
        if read_retrying(slice, &mut probe)? == 0 {
            break;
        }
        *done += PROBE_LEN as u64;
    }
    Ok(())
}

impl<T: AsRef<[u8]>> SliceRead for Cursor<T> {
    fn available(&mut self) -> io::Result<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        Ok(len.saturating_sub(self.position()))
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let step = n.min(self.available()?);
        self.set_position(self.position() + step);
        Ok(step)
    }
}

impl<'a> SliceRead for &'a [u8] {
    fn available(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let step = n.min(self.len() as u64) as usize;
        let rest: &'a [u8] = *self;
        *self = &rest[step..];
        Ok(step as u64)
    }
}

impl<S: SliceRead + ?Sized> SliceRead for Box<S> {
    fn available(&mut self) -> io::Result<u64> {
        (**self).available()
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        (**self).skip(n)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// One byte range of a local file, read through its own file handle.
#[derive(Debug)]
pub struct FileSlice {
    inner: io::Take<File>,
}

impl FileSlice {
    pub fn open(path: impl AsRef<Path>, range: Range<u64>) -> io::Result<Self> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(range.start))?;
        let len = range.end.saturating_sub(range.start);
        Ok(Self { inner: file.take(len) })
    }

    /// Bytes left in the range (the file itself may hold fewer).
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }
}

impl Read for FileSlice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl SliceRead for FileSlice {
    fn available(&mut self) -> io::Result<u64> {
        let mut file: &File = self.inner.get_ref();
        let len = file.metadata()?.len();
        let pos = file.stream_position()?;
        Ok(self.remaining().min(len.saturating_sub(pos)))
    }
}
