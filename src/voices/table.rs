//! The per-song voice group, flattened at load time.
//!
//! A voice group is 256 records. Leaf records are stored as-is. Key-split
//! and drum records are expanded into 128 per-key leaves when the song is
//! loaded, so every lookup afterwards is a plain index with exactly one
//! level of indirection. A composite whose sub-entry is itself a composite
//! becomes a per-key error instead of a deeper lookup.

use log::debug;

use crate::rom::Rom;

use super::record::{LeafVoice, Record, RECORD_SIZE};
use super::ResolveError;

pub const VOICE_COUNT: usize = 256;
pub const KEY_COUNT: usize = 128;

type KeyMap = Box<[Result<LeafVoice, ResolveError>]>;

#[derive(Debug, Clone)]
enum Entry {
    Leaf(LeafVoice),
    KeySplit(KeyMap),
    Drum(KeyMap),
    Invalid(ResolveError),
}

/// A leaf voice ready to play, and the key it should sound at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub leaf: LeafVoice,
    pub key: u8,
    /// True when reached through a drum kit.
    pub drum: bool,
}

#[derive(Debug, Clone)]
pub struct VoiceTable {
    offset: u32,
    entries: Vec<Entry>,
}

impl VoiceTable {
    /// A table where every voice fails to resolve.
    pub fn empty() -> Self {
        Self {
            offset: 0,
            entries: vec![Entry::Invalid(ResolveError::Empty); VOICE_COUNT],
        }
    }

    /// Read all 256 records of the voice group at `offset`.
    ///
    /// Never fails as a whole: unreadable or malformed entries resolve to
    /// their error when played.
    pub fn load(rom: &Rom, offset: u32) -> Self {
        let mut invalid = 0;
        let entries = (0..VOICE_COUNT as u32)
            .map(|voice| {
                let entry = Self::load_entry(rom, offset, voice as u8);
                if matches!(entry, Entry::Invalid(_)) {
                    invalid += 1;
                }
                entry
            })
            .collect();

        debug!(
            "voice group at 0x{:06X}: {} of {} records unusable",
            offset, invalid, VOICE_COUNT
        );

        Self { offset, entries }
    }

    fn load_entry(rom: &Rom, table: u32, voice: u8) -> Entry {
        match Record::read(rom, table + voice as u32 * RECORD_SIZE) {
            Ok(Record::Leaf(leaf)) => Entry::Leaf(leaf),
            Ok(Record::KeySplit { table, key_map }) => {
                Entry::KeySplit(Self::expand(rom, table, voice, |key| {
                    rom.read_u8(key_map + key as u32)
                        .map_err(ResolveError::from)
                }))
            }
            Ok(Record::Drum { table }) => {
                Entry::Drum(Self::expand(rom, table, voice, |key| Ok(key)))
            }
            Err(err) => Entry::Invalid(err),
        }
    }

    /// Resolve every key of a composite through `index_of` into `table`.
    fn expand<F>(rom: &Rom, table: u32, voice: u8, index_of: F) -> KeyMap
    where
        F: Fn(u8) -> Result<u8, ResolveError>,
    {
        (0..KEY_COUNT as u8)
            .map(|key| {
                let index = index_of(key)?;
                match Record::read(rom, table + index as u32 * RECORD_SIZE)? {
                    Record::Leaf(leaf) => Ok(leaf),
                    _ => Err(ResolveError::NestedComposite { voice, key }),
                }
            })
            .collect()
    }

    /// Image offset the table was loaded from.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Find the leaf that plays `note` on `voice`.
    pub fn resolve(&self, voice: u8, note: u8) -> Result<Resolved, ResolveError> {
        if note as usize >= KEY_COUNT {
            return Err(ResolveError::KeyOutOfRange(note));
        }

        match &self.entries[voice as usize] {
            Entry::Leaf(leaf) => Ok(Resolved {
                leaf: *leaf,
                key: note,
                drum: false,
            }),
            Entry::KeySplit(keys) => keys[note as usize].map(|leaf| Resolved {
                leaf,
                key: note,
                drum: false,
            }),
            Entry::Drum(keys) => keys[note as usize].map(|leaf| Resolved {
                leaf,
                key: leaf.key,
                drum: true,
            }),
            Entry::Invalid(err) => Err(*err),
        }
    }
}

impl Default for VoiceTable {
    fn default() -> Self {
        Self::empty()
    }
}
