//! Song headers and the cartridge song table.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::rom::{Rom, RomError};
use crate::TRACK_COUNT;

/// Size of one song-table entry: header pointer plus two player ids.
pub const SONG_TABLE_ENTRY: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SongError {
    #[error("song declares {0} tracks, at most 16 are supported")]
    TooManyTracks(u8),

    #[error(transparent)]
    Rom(#[from] RomError),
}

/// A parsed song header. All offsets are image offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub header: u32,
    pub num_blocks: u8,
    pub priority: u8,
    pub reverb: u8,
    pub voice_group: u32,
    pub tracks: ArrayVec<u32, TRACK_COUNT>,
}

impl Song {
    /// Read the header at `header`.
    pub fn read(rom: &Rom, header: u32) -> Result<Self, SongError> {
        let num_tracks = rom.read_u8(header)?;
        if num_tracks as usize > TRACK_COUNT {
            return Err(SongError::TooManyTracks(num_tracks));
        }

        let voice_group = rom.read_pointer(header + 4)?;
        let mut tracks = ArrayVec::new();
        for i in 0..u32::from(num_tracks) {
            tracks.push(rom.read_pointer(header + 8 + i * 4)?);
        }

        Ok(Self {
            header,
            num_blocks: rom.read_u8(header + 1)?,
            priority: rom.read_u8(header + 2)?,
            reverb: rom.read_u8(header + 3)?,
            voice_group,
            tracks,
        })
    }

    /// Read song number `index` from the song table at `table`.
    pub fn from_table(rom: &Rom, table: u32, index: u32) -> Result<Self, SongError> {
        let entry = index
            .checked_mul(SONG_TABLE_ENTRY)
            .and_then(|delta| table.checked_add(delta))
            .ok_or(RomError::OutOfBounds {
                offset: table,
                len: SONG_TABLE_ENTRY,
            })?;
        let header = rom.read_pointer(entry)?;
        Self::read(rom, header)
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::builder::RomBuilder;

    #[test]
    fn reads_header_fields_and_track_pointers() {
        let mut rom = RomBuilder::new();
        rom.bytes(&[0; 16]);
        let header = rom.song_header(0x40, 3, &[0x100, 0x200]);
        let rom = rom.build();

        let song = Song::read(&rom, header).unwrap();
        assert_eq!(song.num_tracks(), 2);
        assert_eq!(song.priority, 3);
        assert_eq!(song.voice_group, 0x40);
        assert_eq!(song.tracks.as_slice(), &[0x100, 0x200]);
    }

    #[test]
    fn song_table_entries_point_at_headers() {
        let mut rom = RomBuilder::new();
        let table = rom.position();
        let first_entry = rom.pointer(0);
        rom.bytes(&[0, 0, 0, 0]);
        let second_entry = rom.pointer(0);
        rom.bytes(&[1, 0, 1, 0]);
        let first = rom.song_header(0x10, 0, &[0x20]);
        let second = rom.song_header(0x10, 0, &[0x30, 0x34, 0x38]);
        rom.patch_pointer(first_entry, first);
        rom.patch_pointer(second_entry, second);
        let rom = rom.build();

        let song = Song::from_table(&rom, table, 1).unwrap();
        assert_eq!(song.header, second);
        assert_eq!(song.num_tracks(), 3);
        assert_eq!(Song::from_table(&rom, table, 0).unwrap().header, first);
    }

    #[test]
    fn song_index_past_the_address_space_is_a_rom_error() {
        let rom = Rom::new(vec![0; 16]);
        let expected = SongError::Rom(RomError::OutOfBounds {
            offset: 8,
            len: SONG_TABLE_ENTRY,
        });
        assert_eq!(Song::from_table(&rom, 8, u32::MAX), Err(expected));
        assert_eq!(Song::from_table(&rom, 8, u32::MAX / SONG_TABLE_ENTRY), Err(expected));
    }

    #[test]
    fn too_many_tracks_is_rejected() {
        let rom = Rom::new(vec![17, 0, 0, 0, 0, 0, 0, 8]);
        assert_eq!(Song::read(&rom, 0), Err(SongError::TooManyTracks(17)));
    }

    #[test]
    fn truncated_header_is_a_rom_error() {
        let rom = Rom::new(vec![2, 0, 0, 0]);
        assert!(matches!(Song::read(&rom, 0), Err(SongError::Rom(_))));
    }
}
