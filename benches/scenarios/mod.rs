//! Whole-song scenarios.

mod song;

pub use song::bench_song;
