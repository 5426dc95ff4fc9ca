//! Shared fixtures: a recording backend and a small hand-assembled voice group.

#![allow(dead_code)]

use mp2k_player::io::{AudioBackend, BackendError, SampleRef, VoiceGroup};
use mp2k_player::rom::builder::RomBuilder;
use mp2k_player::voices::{Adsr, TYPE_SQUARE1};
use mp2k_player::{Player, PlayerConfig, Rom};

/// Instant attack, full sustain, instant release.
pub const GATE: Adsr = Adsr::new(255, 0, 255, 0);

pub const VOICE_PIANO: u8 = 0;
pub const VOICE_SQUARE: u8 = 1;
pub const VOICE_DRUMS: u8 = 2;
pub const VOICE_SPLIT: u8 = 3;
pub const VOICE_NESTED: u8 = 4;
pub const VOICE_NOISE: u8 = 5;

pub const PIANO_RATE: u32 = 8000;
pub const BASS_RATE: u32 = 4000;
/// Drum key with a non-default base key.
pub const DRUM_KEY: u8 = 36;
pub const DRUM_BASE_KEY: u8 = 72;
/// Split point of the key-split voice.
pub const SPLIT_KEY: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Play {
        group: VoiceGroup,
        sample: SampleRef,
        handle: u32,
    },
    Frequency(u32, f32),
    Pan(u32, f32),
    Volume(u32, f32),
    Priority(u32, u8),
    Stop(u32),
}

/// Backend that records every call, optionally refusing to play.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub fail_plays: bool,
    pub renders: usize,
    pub next: u32,
}

impl RecordingBackend {
    pub fn plays(&self) -> Vec<(VoiceGroup, SampleRef, u32)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                Call::Play { group, sample, handle } => Some((group, sample, handle)),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                Call::Stop(handle) => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn last_frequency(&self, handle: u32) -> Option<f32> {
        self.calls.iter().rev().find_map(|call| match *call {
            Call::Frequency(h, hz) if h == handle => Some(hz),
            _ => None,
        })
    }

    pub fn last_volume(&self, handle: u32) -> Option<f32> {
        self.calls.iter().rev().find_map(|call| match *call {
            Call::Volume(h, volume) if h == handle => Some(volume),
            _ => None,
        })
    }

    pub fn last_pan(&self, handle: u32) -> Option<f32> {
        self.calls.iter().rev().find_map(|call| match *call {
            Call::Pan(h, pan) if h == handle => Some(pan),
            _ => None,
        })
    }
}

impl AudioBackend for RecordingBackend {
    type Handle = u32;

    fn play(&mut self, group: VoiceGroup, sample: SampleRef) -> Result<u32, BackendError> {
        if self.fail_plays {
            return Err(BackendError::MissingSample(sample));
        }
        let handle = self.next;
        self.next += 1;
        self.calls.push(Call::Play { group, sample, handle });
        Ok(handle)
    }

    fn set_frequency(&mut self, handle: u32, hz: f32) {
        self.calls.push(Call::Frequency(handle, hz));
    }

    fn set_pan(&mut self, handle: u32, pan: f32) {
        self.calls.push(Call::Pan(handle, pan));
    }

    fn set_volume(&mut self, handle: u32, volume: f32) {
        self.calls.push(Call::Volume(handle, volume));
    }

    fn set_priority(&mut self, handle: u32, priority: u8) {
        self.calls.push(Call::Priority(handle, priority));
    }

    fn stop(&mut self, handle: u32) {
        self.calls.push(Call::Stop(handle));
    }

    fn render(&mut self) {
        self.renders += 1;
    }
}

/// An image with samples and a voice group already placed; tests append
/// their track data to `rom` and then call [`Fixture::finish`].
pub struct Fixture {
    pub rom: RomBuilder,
    pub group: u32,
    pub piano: u32,
    pub bass: u32,
}

impl Fixture {
    pub fn new() -> Self {
        let mut rom = RomBuilder::new();
        let piano = rom.pcm_sample(PIANO_RATE, 16);
        let bass = rom.pcm_sample(BASS_RATE, 16);
        rom.align(4);

        // Drum kit: every key plays the piano sample at key 60, except one.
        let drums = rom.position();
        for key in 0..128u8 {
            let base = if key == DRUM_KEY { DRUM_BASE_KEY } else { 60 };
            rom.bytes(&RomBuilder::direct_sound_voice(base, None, piano, GATE));
        }

        // Key split: bass below the split point, piano from it up.
        let split_table = rom.bytes(&RomBuilder::direct_sound_voice(60, None, bass, GATE));
        rom.bytes(&RomBuilder::direct_sound_voice(60, Some(-32), piano, GATE));
        let key_map: Vec<u8> = (0..128u8).map(|key| u8::from(key >= SPLIT_KEY)).collect();
        let key_map = rom.bytes(&key_map);
        rom.align(4);

        // A kit whose entries are themselves drum kits.
        let nested = rom.bytes(&RomBuilder::drum_voice(drums));

        let group = rom.position();
        rom.bytes(&RomBuilder::direct_sound_voice(60, None, piano, GATE));
        rom.bytes(&RomBuilder::square_voice(TYPE_SQUARE1, 2, Adsr::new(15, 0, 15, 0)));
        rom.bytes(&RomBuilder::drum_voice(drums));
        rom.bytes(&RomBuilder::key_split_voice(split_table, key_map));
        rom.bytes(&RomBuilder::drum_voice(nested));
        rom.bytes(&RomBuilder::noise_voice(0, Adsr::new(15, 0, 15, 0)));

        Self {
            rom,
            group,
            piano,
            bass,
        }
    }

    /// Append one track's bytes, returning its offset.
    pub fn track(&mut self, bytes: &[u8]) -> u32 {
        self.rom.bytes(bytes)
    }

    /// Write the song header for `tracks` and build the image.
    pub fn finish(mut self, tracks: &[u32]) -> (Rom, u32) {
        let header = self.rom.song_header(self.group, 0, tracks);
        (self.rom.build(), header)
    }

    /// Build a song from whole tracks and load it into a fresh player.
    pub fn player(mut self, tracks: &[&[u8]]) -> Player<RecordingBackend> {
        let offsets: Vec<u32> = tracks.iter().map(|bytes| self.track(bytes)).collect();
        let (rom, header) = self.finish(&offsets);
        load(rom, header, RecordingBackend::default())
    }
}

pub fn load(rom: Rom, header: u32, backend: RecordingBackend) -> Player<RecordingBackend> {
    let mut player = Player::new(rom, backend, PlayerConfig::default());
    player.load_song(header).expect("song header should parse");
    player
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() <= b.abs() * 1e-4 + 1e-4
}
