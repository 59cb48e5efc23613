// crates/wbat-trace/src/lib.rs

//! Packed per-execution bit traces and the sliding window reader.
//!
//! A trace set is a directory of `NNNN.bin` / `NNNN.pt` / `NNNN.ct` files;
//! the reader materializes, window by window, the per-bit-offset column
//! vectors across all traces.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod reader;
pub mod set;

pub use reader::{WindowPlan, WindowReader, WindowView};
pub use set::{InputError, TraceSet};
