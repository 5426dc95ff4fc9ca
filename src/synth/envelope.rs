/*
Hardware Envelope
=================

The driver steps every voice envelope once per sequencer tick, using integer
arithmetic on an 8-bit level ("velocity", 0..=255).

Vocabulary
----------

  velocity    Envelope output level, 0..=255. Multiplied with the note's own
              velocity and the track volume to get the mixed volume.

  duration    Note length in ticks, or TIE (0xFF) for "hold until EOT".

  age         Ticks since the voice was started.

The State Machine
-----------------

  Attack    velocity += A            velocity >= 255  -> clamp, Decay
                                     age > duration   -> Decay
  Decay     velocity = v * D / 256   velocity <= S    -> clamp to S, Sustain
                                     age >= duration  -> Release
  Sustain   hold                     age >= duration  -> Release
  Release   velocity = v * R / 256   velocity == 0    -> silent (voice stops)

A timed note checks its duration before the stage's own step, so a note
that expires in Decay or Sustain takes its first release step on the same
tick. TIE notes only leave Sustain through an explicit release.

Because release is a multiply by R/256 with truncation, the level always
reaches zero: R = 0 silences on the first release step, R = 255 shrinks by
at least one unit per tick.
*/

use crate::voices::Adsr;

/// Duration sentinel: hold until explicitly released.
pub const TIE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Result of one envelope step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sounding,
    /// Release finished; the voice must be stopped.
    Silent,
}

#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    adsr: Adsr,
    stage: EnvelopeStage,
    velocity: u8,
}

impl Envelope {
    /// Start a new envelope in Attack from zero.
    ///
    /// A zero attack rate behaves as an instant attack on hardware.
    pub fn new(adsr: Adsr) -> Self {
        let attack = if adsr.attack == 0 { 255 } else { adsr.attack };
        Self {
            adsr: Adsr { attack, ..adsr },
            stage: EnvelopeStage::Attack,
            velocity: 0,
        }
    }

    /// Jump to Release from any stage.
    pub fn release(&mut self) {
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one tick. `age` is the voice age before this tick.
    pub fn step(&mut self, age: u32, duration: u8) -> Step {
        let timed = duration != TIE;
        let length = u32::from(duration);

        match self.stage {
            EnvelopeStage::Attack if timed && age > length => {
                self.stage = EnvelopeStage::Decay;
            }

            EnvelopeStage::Attack => {
                let level = u16::from(self.velocity) + u16::from(self.adsr.attack);
                if level >= 255 {
                    self.velocity = 255;
                    self.stage = EnvelopeStage::Decay;
                } else {
                    self.velocity = level as u8;
                }
            }

            EnvelopeStage::Decay | EnvelopeStage::Sustain if timed && age >= length => {
                self.release();
                return self.release_step();
            }

            EnvelopeStage::Decay => {
                let level = scale(self.velocity, self.adsr.decay);
                if level <= self.adsr.sustain {
                    self.velocity = self.adsr.sustain;
                    self.stage = EnvelopeStage::Sustain;
                } else {
                    self.velocity = level;
                }
            }

            EnvelopeStage::Sustain => {}

            EnvelopeStage::Release => return self.release_step(),
        }

        Step::Sounding
    }

    fn release_step(&mut self) -> Step {
        self.velocity = scale(self.velocity, self.adsr.release);
        if self.velocity == 0 {
            Step::Silent
        } else {
            Step::Sounding
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current level, 0..=255.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// The envelope parameters in effect (after the zero-attack substitution).
    pub fn adsr(&self) -> Adsr {
        self.adsr
    }
}

/// `value * rate / 256` in integer arithmetic.
fn scale(value: u8, rate: u8) -> u8 {
    ((u16::from(value) * u16::from(rate)) >> 8) as u8
}
