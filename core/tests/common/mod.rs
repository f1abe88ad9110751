// Shared fixtures for the integration tests: slices that record how often
// they were opened and closed.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io::{self, Cursor, Read};
use std::rc::Rc;

use slice_core::slice::SliceRead;

/// Every slice instance handed out by a tracked factory, in open order.
#[derive(Default, Clone)]
pub struct OpenLog {
    opened: Rc<RefCell<Vec<(usize, Rc<Cell<usize>>)>>>,
}

impl OpenLog {
    fn register(&self, index: usize) -> Rc<Cell<usize>> {
        let closes = Rc::new(Cell::new(0));
        self.opened.borrow_mut().push((index, closes.clone()));
        closes
    }

    pub fn opens(&self) -> usize {
        self.opened.borrow().len()
    }

    pub fn opened_indices(&self) -> Vec<usize> {
        self.opened.borrow().iter().map(|(i, _)| *i).collect()
    }

    /// Close count of each opened instance, in open order.
    pub fn close_counts(&self) -> Vec<usize> {
        self.opened.borrow().iter().map(|(_, c)| c.get()).collect()
    }

    /// Close count of the most recent instance of slice `index`.
    pub fn last_close_count(&self, index: usize) -> Option<usize> {
        self.opened
            .borrow()
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, c)| c.get())
    }
}

pub struct TrackedSlice {
    data: Cursor<Vec<u8>>,
    closes: Rc<Cell<usize>>,
    fail_close: bool,
    /// Cap applied to every native skip, to exercise short skips.
    max_skip: Option<u64>,
}

impl Read for TrackedSlice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl SliceRead for TrackedSlice {
    fn available(&mut self) -> io::Result<u64> {
        self.data.available()
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let n = self.max_skip.map_or(n, |cap| n.min(cap));
        SliceRead::skip(&mut self.data, n)
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes.set(self.closes.get() + 1);
        if self.fail_close {
            return Err(io::Error::other("close failed"));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct TrackedOptions {
    pub fail_close: bool,
    pub max_skip: Option<u64>,
}

pub fn tracked_factory(
    parts: Vec<Vec<u8>>,
    log: OpenLog,
) -> impl FnMut(usize) -> io::Result<TrackedSlice> {
    tracked_factory_with(parts, log, TrackedOptions::default())
}

pub fn tracked_factory_with(
    parts: Vec<Vec<u8>>,
    log: OpenLog,
    options: TrackedOptions,
) -> impl FnMut(usize) -> io::Result<TrackedSlice> {
    move |index| {
        let bytes = parts[index].clone();
        Ok(TrackedSlice {
            data: Cursor::new(bytes),
            closes: log.register(index),
            fail_close: options.fail_close,
            max_skip: options.max_skip,
        })
    }
}

/// Deterministic pseudo-random bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 3)) as u8).collect()
}

/// Split `data` at the given (sorted, in-range) cut points.
pub fn split_at(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut parts = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts {
        parts.push(data[start..cut].to_vec());
        start = cut;
    }
    parts.push(data[start..].to_vec());
    parts
}

/// Split `data` into `parts` slices of equal size, the last taking the rest.
pub fn split_even(data: &[u8], parts: usize) -> Vec<Vec<u8>> {
    let size = data.len() / parts;
    let cuts: Vec<usize> = (1..parts).map(|i| i * size).collect();
    split_at(data, &cuts)
}
