//! Assemble small cartridge images by hand.
//!
//! Used for the built-in demo song and for tests: place sequence bytes,
//! samples, voice records and song headers, then patch pointers once their
//! targets are known. All stored pointers are written as cartridge addresses.

use byteorder::{ByteOrder, LittleEndian};

use crate::voices::{Adsr, TYPE_DIRECT_SOUND, TYPE_DRUM, TYPE_GB_WAVE, TYPE_KEY_SPLIT, TYPE_NOISE};

use super::{Rom, ROM_BASE};

#[derive(Debug, Default, Clone)]
pub struct RomBuilder {
    bytes: Vec<u8>,
}

impl RomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next byte will be written at.
    pub fn position(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Append raw bytes, returning where they start.
    pub fn bytes(&mut self, bytes: &[u8]) -> u32 {
        let at = self.position();
        self.bytes.extend_from_slice(bytes);
        at
    }

    /// Append a cartridge address for image offset `target`.
    pub fn pointer(&mut self, target: u32) -> u32 {
        let mut word = [0u8; 4];
        LittleEndian::write_u32(&mut word, ROM_BASE + target);
        self.bytes(&word)
    }

    /// Overwrite the 4 bytes at `at` with a cartridge address for `target`.
    pub fn patch_pointer(&mut self, at: u32, target: u32) {
        let at = at as usize;
        LittleEndian::write_u32(&mut self.bytes[at..at + 4], ROM_BASE + target);
    }

    /// Pad with zeros to a multiple of `align`.
    pub fn align(&mut self, align: u32) {
        while self.position() % align != 0 {
            self.bytes.push(0);
        }
    }

    /// A PCM sample header plus `len` bytes of silence; returns the header offset.
    pub fn pcm_sample(&mut self, rate_hz: u32, len: u32) -> u32 {
        self.align(4);
        let mut header = [0u8; 16];
        LittleEndian::write_u32(&mut header[4..8], rate_hz << 10);
        LittleEndian::write_u32(&mut header[12..16], len);
        let at = self.bytes(&header);
        self.bytes.resize(self.bytes.len() + len as usize, 0);
        at
    }

    /// A song header for `tracks` track offsets and the voice group at `voice_group`.
    pub fn song_header(&mut self, voice_group: u32, priority: u8, tracks: &[u32]) -> u32 {
        self.align(4);
        let at = self.bytes(&[tracks.len() as u8, 0, priority, 0]);
        self.pointer(voice_group);
        for &track in tracks {
            self.pointer(track);
        }
        at
    }

    pub fn build(self) -> Rom {
        Rom::new(self.bytes)
    }

    /// Direct-sound record; `pan` forces the voice pan (`-64..=63`).
    pub fn direct_sound_voice(key: u8, pan: Option<i8>, sample: u32, env: Adsr) -> [u8; 12] {
        let pan = pan.map_or(0, |p| 0x80 | (p + 0x40) as u8 & 0x7F);
        let mut record = [TYPE_DIRECT_SOUND, key, 0, pan, 0, 0, 0, 0, 0, 0, 0, 0];
        LittleEndian::write_u32(&mut record[4..8], ROM_BASE + sample);
        Self::envelope(&mut record, env);
        record
    }

    /// Square-channel record (`tag` is one of the square type codes).
    pub fn square_voice(tag: u8, duty: u8, env: Adsr) -> [u8; 12] {
        let mut record = [tag, 60, 0, 0, duty, 0, 0, 0, 0, 0, 0, 0];
        Self::envelope(&mut record, env);
        record
    }

    pub fn wave_voice(wave: u32, env: Adsr) -> [u8; 12] {
        let mut record = [TYPE_GB_WAVE, 60, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        LittleEndian::write_u32(&mut record[4..8], ROM_BASE + wave);
        Self::envelope(&mut record, env);
        record
    }

    pub fn noise_voice(period: u8, env: Adsr) -> [u8; 12] {
        let mut record = [TYPE_NOISE, 60, 0, 0, period, 0, 0, 0, 0, 0, 0, 0];
        Self::envelope(&mut record, env);
        record
    }

    pub fn key_split_voice(table: u32, key_map: u32) -> [u8; 12] {
        let mut record = [TYPE_KEY_SPLIT, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        LittleEndian::write_u32(&mut record[4..8], ROM_BASE + table);
        LittleEndian::write_u32(&mut record[8..12], ROM_BASE + key_map);
        record
    }

    pub fn drum_voice(table: u32) -> [u8; 12] {
        let mut record = [TYPE_DRUM, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        LittleEndian::write_u32(&mut record[4..8], ROM_BASE + table);
        record
    }

    fn envelope(record: &mut [u8; 12], env: Adsr) {
        record[8..12].copy_from_slice(&[env.attack, env.decay, env.sustain, env.release]);
    }
}
