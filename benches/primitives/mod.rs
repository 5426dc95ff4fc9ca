//! Benchmarks for the per-command and per-voice building blocks.

mod allocator;
mod decode;
mod envelope;

pub use allocator::bench_allocator;
pub use decode::bench_decode;
pub use envelope::bench_envelope;
