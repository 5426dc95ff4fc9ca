//! Full ticks over looping songs with 1, 4 and 16 busy tracks.
//!
//! Each track plays an arpeggio of short notes on a sample voice with a
//! bend sweep and vibrato, so every tick decodes, allocates (and steals
//! once the pool is full) and pushes pitch to the backend.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use mp2k_player::io::NullBackend;
use mp2k_player::rom::builder::RomBuilder;
use mp2k_player::sequencing::command::{BEND, GOTO, LFOS, MOD, PRIO, VOL};
use mp2k_player::voices::Adsr;
use mp2k_player::{Player, PlayerConfig};

use crate::TRACK_LOADS;

fn busy_song(tracks: usize) -> Player<NullBackend> {
    let mut rom = RomBuilder::new();
    let sample = rom.pcm_sample(13_379, 64);
    rom.align(4);
    let group = rom.bytes(&RomBuilder::direct_sound_voice(
        60,
        None,
        sample,
        Adsr::new(255, 220, 160, 200),
    ));

    let mut offsets = Vec::new();
    for track in 0..tracks {
        let start = rom.bytes(&[PRIO, track as u8, VOL, 100, MOD, 20, LFOS, 40]);
        let body = rom.position();
        for step in 0..8u8 {
            rom.bytes(&[0xD6, 48 + step * 3 + track as u8, 110, BEND, 0x40 + step * 4, 0x82]);
        }
        rom.bytes(&[GOTO]);
        rom.pointer(body);
        offsets.push(start);
    }

    let header = rom.song_header(group, 0, &offsets);
    let mut player = Player::new(rom.build(), NullBackend::new(), PlayerConfig::default());
    player.load_song(header).expect("bench song header is well formed");
    player
}

pub fn bench_song(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/song");

    for &tracks in TRACK_LOADS {
        let mut player = busy_song(tracks);
        // warm up until the pool is saturated
        for _ in 0..256 {
            player.tick();
        }
        group.bench_with_input(BenchmarkId::new("tick", tracks), &tracks, |b, _| {
            b.iter(|| black_box(player.tick()))
        });
    }

    group.finish();
}
