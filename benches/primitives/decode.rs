//! Bytecode decoding with and without running status.

use std::hint::black_box;

use criterion::Criterion;
use mp2k_player::rom::Rom;
use mp2k_player::sequencing::command::{decode, RunningStatus, VOL};

fn stream(bytes: &[u8], repeat: usize) -> Rom {
    Rom::new(bytes.repeat(repeat))
}

pub fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives/decode");

    // full note commands: opcode, key, velocity, wait
    let notes = stream(&[0xD7, 60, 100, 0x84], 256);
    group.bench_function("notes", |b| {
        b.iter(|| {
            let mut cursor = notes.cursor(0);
            let mut status = RunningStatus::default();
            while let Ok(command) = decode(&mut cursor, &mut status) {
                black_box(command);
            }
        })
    });

    // a volume sweep written with running status
    let mut sweep = vec![VOL];
    sweep.extend((0..128u8).flat_map(|v| [v, 0x81]));
    let sweep = stream(&sweep, 8);
    group.bench_function("running_status", |b| {
        b.iter(|| {
            let mut cursor = sweep.cursor(0);
            let mut status = RunningStatus::default();
            while let Ok(command) = decode(&mut cursor, &mut status) {
                black_box(command);
            }
        })
    });

    group.finish();
}
