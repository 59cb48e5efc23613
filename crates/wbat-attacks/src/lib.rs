// crates/wbat-attacks/src/lib.rs

//! Trace attacks: exact matching (order 1 and 2) and linear decoding.
//!
//! Both attacks consume the same ingredients, a [`wbat_trace::WindowReader`]
//! over recorded traces and the prediction vectors of a
//! [`wbat_targets::TargetSource`], and feed per-window matches into a
//! monotonic per-byte candidate aggregate.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod exact;
pub mod lda;
pub mod report;
pub mod synth;

pub use exact::{run_exact, ExactOptions, Order};
pub use lda::{run_lda, LdaOptions};
pub use report::{AttackOutcome, Candidates, Match, Report, Witness};
pub use synth::{write_leaky_traces, Leak, SynthSpec};
