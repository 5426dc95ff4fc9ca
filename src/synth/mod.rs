// Purpose: voice slots, envelopes and the fixed slot pools
// This layer sits below the sequencer and talks to the audio backend

pub mod envelope;
pub mod pool;
pub mod voice;

pub use envelope::{Envelope, EnvelopeStage, Step, TIE};
pub use pool::{SlotId, VoicePool, DIRECT_SLOTS, GB_SLOTS};
pub use voice::{Instrument, NoteOn, GB_ENVELOPE_SCALE};

/// LFO output routed to one destination, already scaled by depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Modulation {
    #[default]
    None,
    /// Pitch offset in semitones.
    Pitch(f32),
    /// Attenuation in `[0, 1]`.
    Volume(f32),
    /// Pan offset in `[-1, 1]`.
    Pan(f32),
}

impl Modulation {
    /// Pitch offset in semitones, zero for other destinations.
    pub fn pitch(self) -> f32 {
        match self {
            Modulation::Pitch(semitones) => semitones,
            _ => 0.0,
        }
    }
}

/// Track-level parameters a voice needs to compute its output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackMix {
    /// 0..=127
    pub volume: u8,
    /// -64..=63
    pub pan: i8,
    /// -64..=63
    pub bend: i8,
    /// Semitones at full bend.
    pub bend_range: u8,
    /// 64 steps per semitone.
    pub tune: i8,
    pub priority: u8,
    pub modulation: Modulation,
}
