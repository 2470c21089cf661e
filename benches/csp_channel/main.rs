//! csp channel and select! benchmarks.
//!
//! Run with: cargo +nightly bench --bench csp_channel
//!
//! The teacher's comparison benchmarks raced veloce against crossbeam and
//! std's cross-thread channels; there is no such comparison here, since this
//! crate's channel only makes sense within a single cooperative task
//! (`!Send`, `Rc<RefCell<_>>`-backed). These measure this crate's own
//! operations in isolation instead.

#![feature(test)]

extern crate test;

mod burst;
mod create;
mod latency;
mod oneshot;
mod select;

pub use csp::channel::channel;
pub use test::Bencher;

pub const BUFFER_SIZE: usize = 1024;

/// A single-threaded tokio runtime, built once per benchmark and reused
/// across `b.iter` so the cost measured is the channel/select operation
/// itself, not runtime construction.
pub fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build current-thread runtime")
}
