//! Per-track low-frequency oscillator (MOD / MODT / LFOS / LFODL).

use crate::synth::Modulation;

/// Destination selected by MODT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModType {
    #[default]
    Vibrato,
    Tremolo,
    AutoPan,
}

impl From<u8> for ModType {
    fn from(value: u8) -> Self {
        match value {
            1 => ModType::Tremolo,
            2 => ModType::AutoPan,
            _ => ModType::Vibrato,
        }
    }
}

pub const DEFAULT_LFO_SPEED: u8 = 22;

/// Triangle LFO. The phase is a wrapping byte advanced by `speed` each tick;
/// the output ramps 0 -> +64 -> -64 -> 0 over one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lfo {
    pub speed: u8,
    pub delay: u8,
    pub depth: u8,
    pub kind: ModType,
    phase: u8,
    wait: u8,
}

impl Default for Lfo {
    fn default() -> Self {
        Self {
            speed: DEFAULT_LFO_SPEED,
            delay: 0,
            depth: 0,
            kind: ModType::Vibrato,
            phase: 0,
            wait: 0,
        }
    }
}

impl Lfo {
    /// Restart the cycle; called on every note-on.
    pub fn retrigger(&mut self) {
        self.phase = 0;
        self.wait = self.delay;
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0 && self.speed > 0
    }

    pub fn step(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.wait > 0 {
            self.wait -= 1;
        } else {
            self.phase = self.phase.wrapping_add(self.speed);
        }
    }

    /// Raw triangle value, -64..=64. Zero while delayed or inactive.
    pub fn output(&self) -> i8 {
        if !self.is_active() || self.wait > 0 {
            return 0;
        }
        let phase = self.phase as i16;
        let value = match phase {
            0..=63 => phase,
            64..=191 => 128 - phase,
            _ => phase - 256,
        };
        value as i8
    }

    /// Current output routed and scaled for the voices.
    pub fn modulation(&self) -> Modulation {
        let out = f32::from(self.output()) / 64.0;
        if out == 0.0 {
            return Modulation::None;
        }
        let depth = f32::from(self.depth);
        match self.kind {
            ModType::Vibrato => Modulation::Pitch(out * depth / 64.0),
            ModType::Tremolo => Modulation::Volume((out.abs() * depth / 127.0).min(1.0)),
            ModType::AutoPan => Modulation::Pan((out * depth / 127.0).clamp(-1.0, 1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_peaks_at_quarter_cycle() {
        let mut lfo = Lfo {
            speed: 16,
            depth: 64,
            ..Lfo::default()
        };
        lfo.retrigger();
        let mut outputs = Vec::new();
        for _ in 0..16 {
            lfo.step();
            outputs.push(lfo.output());
        }
        assert_eq!(outputs[3], 64);
        assert_eq!(outputs[7], 0);
        assert_eq!(outputs[11], -64);
        assert_eq!(outputs[15], 0);
    }

    #[test]
    fn delay_holds_output_at_zero() {
        let mut lfo = Lfo {
            speed: 32,
            delay: 3,
            depth: 127,
            ..Lfo::default()
        };
        lfo.retrigger();
        for _ in 0..3 {
            lfo.step();
            assert_eq!(lfo.modulation(), Modulation::None);
        }
        lfo.step();
        assert_eq!(lfo.output(), 32);
    }

    #[test]
    fn zero_depth_disables_modulation() {
        let mut lfo = Lfo::default();
        for _ in 0..10 {
            lfo.step();
        }
        assert_eq!(lfo.modulation(), Modulation::None);
    }

    #[test]
    fn mod_type_selects_destination() {
        let mut lfo = Lfo {
            speed: 64,
            depth: 64,
            ..Lfo::default()
        };
        lfo.step();
        assert_eq!(lfo.modulation(), Modulation::Pitch(1.0));

        lfo.kind = ModType::from(1);
        assert!(matches!(lfo.modulation(), Modulation::Volume(v) if v > 0.5 && v < 0.51));

        lfo.kind = ModType::from(2);
        assert!(matches!(lfo.modulation(), Modulation::Pan(p) if p > 0.5));
    }
}
