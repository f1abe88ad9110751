//! slice: lazily opened slices read as one continuous stream.
//!
//! Layering:
//! - `source`: what a single slice must offer (`SliceRead`)
//! - `factory`: how slices are opened by index (`SliceFactory`)
//! - `chained`: the stream stitching them together (`ChainedSliceStream`)

pub mod source;
pub mod factory;
pub mod mark;
pub mod chained;

pub use source::{FileSlice, SliceRead};
pub use factory::{BoxedSliceFactory, FileRangeSlices, MemorySlices, SliceFactory};
pub use mark::Mark;
pub use chained::ChainedSliceStream;
