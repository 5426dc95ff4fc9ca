//! Envelope stepping across a whole note.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use mp2k_player::synth::{Envelope, Step, TIE};
use mp2k_player::voices::Adsr;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives/envelope");

    for &(name, adsr) in &[
        ("pluck", Adsr::new(255, 200, 0, 180)),
        ("pad", Adsr::new(8, 250, 180, 240)),
    ] {
        group.bench_with_input(BenchmarkId::new("timed", name), &adsr, |b, &adsr| {
            b.iter(|| {
                let mut env = Envelope::new(adsr);
                let mut age = 0;
                while env.step(age, black_box(96)) == Step::Sounding && age < 4096 {
                    age += 1;
                }
                black_box(env.velocity())
            })
        });

        group.bench_with_input(BenchmarkId::new("tie", name), &adsr, |b, &adsr| {
            b.iter(|| {
                let mut env = Envelope::new(adsr);
                for age in 0..192 {
                    env.step(age, TIE);
                }
                env.release();
                let mut age = 192;
                while env.step(age, TIE) == Step::Sounding && age < 4096 {
                    age += 1;
                }
                black_box(env.velocity())
            })
        });
    }

    group.finish();
}
