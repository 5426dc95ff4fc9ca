//! One hardware voice slot.
//!
//! Slots are created once and reused for every note. A slot is free when it
//! is not playing; while playing it holds exactly one backend handle and
//! remembers which track started it (by index only, the track owns nothing
//! of the slot).

use log::warn;

use crate::io::{AudioBackend, BackendError, VoiceGroup};
use crate::voices::{Adsr, LeafVoice, Resolved};

use super::envelope::{Envelope, EnvelopeStage, Step, TIE};
use super::{Modulation, TrackMix};

/// GB envelope nibbles are stretched onto the 0..=255 direct-sound range.
pub const GB_ENVELOPE_SCALE: u8 = 17;

/// Everything needed to start a note on a slot.
#[derive(Debug, Clone, Copy)]
pub struct NoteOn {
    pub track: usize,
    /// Note as decoded from the sequence, used to match EOT.
    pub note: u8,
    pub voice: Resolved,
    /// Note-on velocity, 0..=127.
    pub velocity: u8,
    /// Length in ticks, or [`TIE`].
    pub duration: u8,
    /// Ticks to wait before the envelope starts.
    pub latency: u8,
}

#[derive(Debug)]
pub struct Instrument<H> {
    group: VoiceGroup,
    playing: bool,
    note: u8,
    key: u8,
    velocity: u8,
    duration: u8,
    latency: u8,
    age: u32,
    /// Vibrato offset included in the last frequency push.
    vibrato: f32,
    envelope: Envelope,
    leaf: Option<LeafVoice>,
    owner: Option<usize>,
    handle: Option<H>,
}

impl<H: Copy + Eq + std::fmt::Debug> Instrument<H> {
    pub fn new(group: VoiceGroup) -> Self {
        Self {
            group,
            playing: false,
            note: 0,
            key: 0,
            velocity: 0,
            duration: 0,
            latency: 0,
            age: 0,
            vibrato: 0.0,
            envelope: Envelope::new(Adsr::default()),
            leaf: None,
            owner: None,
            handle: None,
        }
    }

    /// Start a note. The slot must already be stopped.
    ///
    /// On a backend failure the slot stays free and the note is silent.
    pub fn play<B>(&mut self, on: NoteOn, mix: &TrackMix, backend: &mut B) -> Result<(), BackendError>
    where
        B: AudioBackend<Handle = H>,
    {
        debug_assert!(!self.playing, "slot must be stopped before reuse");

        let leaf = on.voice.leaf;
        let adsr = match leaf.kind.gb_kind() {
            Some(_) => scale_gb(leaf.envelope),
            None => leaf.envelope,
        };

        let handle = backend.play(self.group, leaf.kind.sample_ref())?;

        self.note = on.note;
        self.key = on.voice.key;
        self.velocity = on.velocity.min(127);
        self.duration = on.duration;
        self.latency = on.latency;
        self.age = 0;
        self.envelope = Envelope::new(adsr);
        self.leaf = Some(leaf);
        self.owner = Some(on.track);
        self.handle = Some(handle);
        self.playing = true;

        backend.set_priority(handle, mix.priority);
        self.push_frequency(mix, backend);
        self.push_mix(mix, backend);
        Ok(())
    }

    /// Enter Release now, whatever the age or duration.
    pub fn trigger_release(&mut self) {
        if self.playing {
            self.envelope.release();
        }
    }

    /// Advance one tick. Returns `false` once the slot is (or already was) free.
    pub fn tick<B>(&mut self, mix: &TrackMix, backend: &mut B) -> bool
    where
        B: AudioBackend<Handle = H>,
    {
        if !self.playing {
            return false;
        }

        if self.latency > 0 {
            self.latency -= 1;
            return true;
        }

        if self.envelope.step(self.age, self.duration) == Step::Silent {
            self.stop(backend);
            return false;
        }

        if mix.modulation.pitch() != self.vibrato {
            self.push_frequency(mix, backend);
        }
        self.push_mix(mix, backend);
        self.age += 1;
        true
    }

    /// Hard stop. Safe on a free slot. Returns the track that owned the slot.
    pub fn stop<B>(&mut self, backend: &mut B) -> Option<usize>
    where
        B: AudioBackend<Handle = H>,
    {
        if let Some(handle) = self.handle.take() {
            backend.set_volume(handle, 0.0);
            backend.stop(handle);
        }
        self.playing = false;
        self.owner.take()
    }

    /// Push volume and pan after a track-level change.
    pub fn push_mix<B>(&self, mix: &TrackMix, backend: &mut B)
    where
        B: AudioBackend<Handle = H>,
    {
        if let Some(handle) = self.handle {
            backend.set_volume(handle, self.volume(mix));
            backend.set_pan(handle, self.pan(mix));
        }
    }

    /// Push the playback frequency after a bend, tune or LFO change.
    pub fn push_frequency<B>(&mut self, mix: &TrackMix, backend: &mut B)
    where
        B: AudioBackend<Handle = H>,
    {
        self.vibrato = mix.modulation.pitch();
        if let (Some(handle), Some(hz)) = (self.handle, self.frequency(mix)) {
            if hz.is_finite() {
                backend.set_frequency(handle, hz);
            } else {
                warn!("slot {:?}: pitch out of range, frequency not updated", self.group);
            }
        }
    }

    pub fn push_priority<B>(&self, priority: u8, backend: &mut B)
    where
        B: AudioBackend<Handle = H>,
    {
        if let Some(handle) = self.handle {
            backend.set_priority(handle, priority);
        }
    }

    /// Mixed volume in `[0, 1]`: envelope x note velocity x track volume.
    pub fn volume(&self, mix: &TrackMix) -> f32 {
        if !self.playing || self.latency > 0 {
            return 0.0;
        }
        let envelope = f32::from(self.envelope.velocity()) / 255.0;
        let velocity = f32::from(self.velocity) / 127.0;
        let track = f32::from(mix.volume.min(127)) / 127.0;
        let tremolo = match mix.modulation {
            Modulation::Volume(depth) => 1.0 - depth,
            _ => 1.0,
        };
        (envelope * velocity * track * tremolo).clamp(0.0, 1.0)
    }

    /// Pan in `[-1, 1]`: the voice's forced pan if it has one, else the track's.
    pub fn pan(&self, mix: &TrackMix) -> f32 {
        let forced = self.leaf.and_then(|leaf| leaf.pan);
        let base = f32::from(forced.unwrap_or(mix.pan)) / 64.0;
        let swing = match mix.modulation {
            Modulation::Pan(offset) => offset,
            _ => 0.0,
        };
        (base + swing).clamp(-1.0, 1.0)
    }

    /// Playback frequency in Hz, `None` while free.
    ///
    /// `base * 2^((key - 60) / 12) * 2^(bend * range / (64 * 12))`, plus fine
    /// tune and vibrato; fixed-frequency sources always play at their base rate.
    pub fn frequency(&self, mix: &TrackMix) -> Option<f32> {
        let kind = self.leaf?.kind;
        if kind.is_fixed_frequency() {
            return Some(kind.base_frequency());
        }

        let semitones = f32::from(self.key) - 60.0
            + f32::from(mix.bend) * f32::from(mix.bend_range) / 64.0
            + f32::from(mix.tune) / 64.0
            + mix.modulation.pitch();
        Some(kind.base_frequency() * (semitones / 12.0).exp2())
    }

    pub fn group(&self) -> VoiceGroup {
        self.group
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_releasing(&self) -> bool {
        self.playing && self.envelope.stage() == EnvelopeStage::Release
    }

    pub fn is_tied(&self) -> bool {
        self.duration == TIE
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    /// Envelope level, 0..=255.
    pub fn envelope_velocity(&self) -> u8 {
        self.envelope.velocity()
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn owner(&self) -> Option<usize> {
        self.owner
    }

    pub fn handle(&self) -> Option<H> {
        self.handle
    }
}

fn scale_gb(adsr: Adsr) -> Adsr {
    let stretch = |nibble: u8| (nibble & 0x0F) * GB_ENVELOPE_SCALE;
    Adsr::new(
        stretch(adsr.attack),
        stretch(adsr.decay),
        stretch(adsr.sustain),
        stretch(adsr.release),
    )
}
