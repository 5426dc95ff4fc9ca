//! Benchmarks for the sequencer core.
//!
//! Run with: cargo bench
//!
//! One tick must finish well inside the tick interval:
//!   - tempo 150 = 16.7ms
//!   - tempo 510 =  4.9ms (the fastest a song can ask for)
//!
//! Benchmark groups:
//!   - primitives/* Decoder, envelope and allocator in isolation
//!   - scenarios/*  Whole ticks over songs of increasing density

use criterion::{criterion_group, criterion_main};

mod primitives;
mod scenarios;

/// Number of busy tracks in the scenario songs.
pub const TRACK_LOADS: &[usize] = &[1, 4, 16];

criterion_group!(
    benches,
    primitives::bench_decode,
    primitives::bench_envelope,
    primitives::bench_allocator,
    scenarios::bench_song,
);
criterion_main!(benches);
