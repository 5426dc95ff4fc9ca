//! Decoding of the 12-byte voice records stored in a voice group.
//!
//! ```text
//!  byte  0      1     2      3          4..8              8  9  10 11
//!       type   key   len   pan/sweep   address/duty      A  D  S  R
//! ```
//!
//! Key-split records replace the envelope with a pointer to the key map,
//! drum records leave it unused.

use crate::io::SampleRef;
use crate::rom::{Rom, RomError};

use super::ResolveError;

pub const RECORD_SIZE: u32 = 12;

pub const TYPE_DIRECT_SOUND: u8 = 0x00;
pub const TYPE_SQUARE1: u8 = 0x01;
pub const TYPE_SQUARE2: u8 = 0x02;
pub const TYPE_GB_WAVE: u8 = 0x03;
pub const TYPE_NOISE: u8 = 0x04;
/// Direct sound: play at the sample's own rate regardless of note.
/// GB channels: same channel, set on "no resample" variants.
pub const FLAG_FIXED: u8 = 0x08;
pub const FLAG_REVERSE: u8 = 0x10;
pub const TYPE_KEY_SPLIT: u8 = 0x40;
pub const TYPE_DRUM: u8 = 0x80;

/// Pitch a GB tone channel reaches at key 60.
pub const MIDDLE_C_HZ: f32 = 261.625_58;

/// Envelope parameters as stored in the record.
///
/// Direct-sound values use the full byte range; GB values are nibbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adsr {
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
}

impl Adsr {
    pub const fn new(attack: u8, decay: u8, sustain: u8, release: u8) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// The four programmable-sound-generator channels, one fixed slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GbKind {
    Square1,
    Square2,
    Wave,
    Noise,
}

impl GbKind {
    pub const ALL: [GbKind; 4] = [GbKind::Square1, GbKind::Square2, GbKind::Wave, GbKind::Noise];

    pub fn index(self) -> usize {
        match self {
            GbKind::Square1 => 0,
            GbKind::Square2 => 1,
            GbKind::Wave => 2,
            GbKind::Noise => 3,
        }
    }
}

/// Sound source of a leaf voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafKind {
    DirectSound {
        /// Image offset of the sample header.
        sample: u32,
        /// Native playback rate of the sample, in Hz.
        sample_rate: f32,
        fixed: bool,
        reverse: bool,
    },
    Square1 { sweep: u8, duty: u8 },
    Square2 { duty: u8 },
    GbWave { wave: u32 },
    Noise { period: u8 },
}

impl LeafKind {
    /// The dedicated slot this leaf plays on, or `None` for the direct pool.
    pub fn gb_kind(&self) -> Option<GbKind> {
        match self {
            LeafKind::DirectSound { .. } => None,
            LeafKind::Square1 { .. } => Some(GbKind::Square1),
            LeafKind::Square2 { .. } => Some(GbKind::Square2),
            LeafKind::GbWave { .. } => Some(GbKind::Wave),
            LeafKind::Noise { .. } => Some(GbKind::Noise),
        }
    }

    /// Frequency the source produces at key 60 with no bend.
    pub fn base_frequency(&self) -> f32 {
        match self {
            LeafKind::DirectSound { sample_rate, .. } => *sample_rate,
            _ => MIDDLE_C_HZ,
        }
    }

    /// Fixed-frequency sources ignore note and bend.
    pub fn is_fixed_frequency(&self) -> bool {
        matches!(self, LeafKind::DirectSound { fixed: true, .. })
    }

    pub fn sample_ref(&self) -> SampleRef {
        match *self {
            LeafKind::DirectSound {
                sample, reverse, ..
            } => SampleRef::Pcm {
                header: sample,
                reverse,
            },
            LeafKind::Square1 { sweep, duty } => SampleRef::Square {
                duty,
                sweep: Some(sweep),
            },
            LeafKind::Square2 { duty } => SampleRef::Square { duty, sweep: None },
            LeafKind::GbWave { wave } => SampleRef::Wave { offset: wave },
            LeafKind::Noise { period } => SampleRef::Noise { period },
        }
    }
}

/// A playable voice: one sound source plus its envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafVoice {
    pub kind: LeafKind,
    /// Base key; drum entries play at this key instead of the struck note.
    pub key: u8,
    /// Forced pan in `-64..=63`, overriding the track pan.
    pub pan: Option<i8>,
    pub envelope: Adsr,
}

/// One undecoded-composite record as read from the image.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Leaf(LeafVoice),
    KeySplit { table: u32, key_map: u32 },
    Drum { table: u32 },
}

impl Record {
    /// Read and decode the record at `offset`.
    pub fn read(rom: &Rom, offset: u32) -> Result<Record, ResolveError> {
        let bytes = rom.slice(offset, RECORD_SIZE)?;
        let tag = bytes[0];
        let key = bytes[1];
        let adsr = Adsr::from_bytes(&bytes[8..12]);
        let word = |at: u32| rom.read_pointer(offset + at);

        let kind = match tag {
            TYPE_KEY_SPLIT => {
                return Ok(Record::KeySplit {
                    table: word(4)?,
                    key_map: word(8)?,
                })
            }
            TYPE_DRUM => return Ok(Record::Drum { table: word(4)? }),
            t if t & !(FLAG_FIXED | FLAG_REVERSE) == TYPE_DIRECT_SOUND => {
                let sample = word(4)?;
                LeafKind::DirectSound {
                    sample,
                    sample_rate: sample_rate(rom, sample)?,
                    fixed: t & FLAG_FIXED != 0,
                    reverse: t & FLAG_REVERSE != 0,
                }
            }
            t => match t & !FLAG_FIXED {
                TYPE_SQUARE1 => LeafKind::Square1 {
                    sweep: bytes[3],
                    duty: bytes[4] & 0x03,
                },
                TYPE_SQUARE2 => LeafKind::Square2 {
                    duty: bytes[4] & 0x03,
                },
                TYPE_GB_WAVE => LeafKind::GbWave { wave: word(4)? },
                TYPE_NOISE => LeafKind::Noise {
                    period: bytes[4] & 0x01,
                },
                _ => return Err(ResolveError::UnknownType(tag)),
            },
        };

        let pan = match kind {
            LeafKind::DirectSound { .. } if bytes[3] & 0x80 != 0 => {
                Some((bytes[3] & 0x7F) as i8 - 0x40)
            }
            _ => None,
        };

        Ok(Record::Leaf(LeafVoice {
            kind,
            key,
            pan,
            envelope: adsr,
        }))
    }
}

/// Native rate of a PCM sample, from its header (`pitch` is Hz << 10).
fn sample_rate(rom: &Rom, header: u32) -> Result<f32, RomError> {
    let pitch = rom.read_u32(header + 4)?;
    Ok(pitch as f32 / 1024.0)
}
