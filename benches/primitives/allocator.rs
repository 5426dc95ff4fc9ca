//! Slot selection in a full pool, where every rule has to be checked.

use std::hint::black_box;

use criterion::Criterion;
use mp2k_player::engine::{SlotView, StealingAllocator, VoiceAllocator};
use mp2k_player::synth::DIRECT_SLOTS;

pub fn bench_allocator(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives/allocator");

    let full: Vec<SlotView> = (0..DIRECT_SLOTS as u32)
        .map(|i| SlotView {
            playing: true,
            releasing: false,
            owner_priority: 5,
            age: (i * 37) % 101,
        })
        .collect();

    let mut allocator = StealingAllocator;
    group.bench_function("steal_oldest", |b| {
        b.iter(|| allocator.select(black_box(&full), black_box(1)))
    });
    group.bench_function("steal_priority", |b| {
        b.iter(|| allocator.select(black_box(&full), black_box(10)))
    });

    group.finish();
}
