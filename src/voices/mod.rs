// Purpose: voice group records and note -> leaf voice resolution

pub mod record;
pub mod table;

use thiserror::Error;

use crate::rom::RomError;

pub use record::{
    Adsr, GbKind, LeafKind, LeafVoice, Record, FLAG_FIXED, FLAG_REVERSE, TYPE_DIRECT_SOUND,
    TYPE_DRUM, TYPE_GB_WAVE, TYPE_KEY_SPLIT, TYPE_NOISE, TYPE_SQUARE1, TYPE_SQUARE2,
};
pub use table::{Resolved, VoiceTable};

/// Why a voice/note pair has nothing to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("voice slot was never loaded")]
    Empty,

    #[error("unknown voice type 0x{0:02X}")]
    UnknownType(u8),

    #[error("composite voice {voice} points at another composite for key {key}")]
    NestedComposite { voice: u8, key: u8 },

    #[error("key {0} is outside the playable range")]
    KeyOutOfRange(u8),

    #[error(transparent)]
    Rom(#[from] RomError),
}
