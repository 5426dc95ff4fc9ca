//! Read-only access to the cartridge image.
//!
//! Sequence data, voice tables and sample headers all live in one flat,
//! little-endian byte image. Pointers stored inside the image are absolute
//! bus addresses (the cartridge is mapped at `0x0800_0000`), so every pointer
//! read from the image is normalized to a file offset before it is used.
//!
//! `Rom` is cheap to clone and is shared between the player, every track
//! cursor and the voice table. Nothing ever writes to it.

pub mod builder;

use std::fmt;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Bus address the cartridge is mapped at.
pub const ROM_BASE: u32 = 0x0800_0000;

/// Largest addressable cartridge (two mirrored 16 MiB windows).
pub const MAX_ROM_SIZE: u32 = 0x0200_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("read of {len} byte(s) at 0x{offset:06X} runs past the end of the image")]
    OutOfBounds { offset: u32, len: u32 },

    #[error("0x{0:08X} is not a cartridge address")]
    BadPointer(u32),
}

/// Convert an absolute cartridge address into an offset into the image.
pub fn normalize_pointer(raw: u32) -> Result<u32, RomError> {
    match raw.checked_sub(ROM_BASE) {
        Some(offset) if offset < MAX_ROM_SIZE => Ok(offset),
        _ => Err(RomError::BadPointer(raw)),
    }
}

/// An immutable, shareable cartridge image.
#[derive(Clone)]
pub struct Rom {
    bytes: Arc<[u8]>,
}

impl Rom {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: u32, len: u32) -> Result<&[u8], RomError> {
        let start = offset as usize;
        let end = start
            .checked_add(len as usize)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(RomError::OutOfBounds { offset, len })?;
        Ok(&self.bytes[start..end])
    }

    pub fn read_u8(&self, offset: u32) -> Result<u8, RomError> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_u32(&self, offset: u32) -> Result<u32, RomError> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }

    /// Read a stored cartridge address and normalize it to an image offset.
    pub fn read_pointer(&self, offset: u32) -> Result<u32, RomError> {
        normalize_pointer(self.read_u32(offset)?)
    }

    /// A sequential reader positioned at `offset`.
    pub fn cursor(&self, offset: u32) -> RomCursor {
        RomCursor {
            rom: self.clone(),
            offset,
        }
    }
}

impl fmt::Debug for Rom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rom").field("len", &self.bytes.len()).finish()
    }
}

/// Sequential reader over a [`Rom`], one per track.
#[derive(Debug, Clone)]
pub struct RomCursor {
    rom: Rom,
    offset: u32,
}

impl RomCursor {
    /// Read one byte and advance.
    pub fn read_byte(&mut self) -> Result<u8, RomError> {
        let byte = self.rom.read_u8(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    /// Read a 4-byte cartridge address, advance, and return it as an image offset.
    pub fn read_pointer(&mut self) -> Result<u32, RomError> {
        let pointer = self.rom.read_pointer(self.offset)?;
        self.offset += 4;
        Ok(pointer)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_byte(&self) -> Result<u8, RomError> {
        self.peek_byte_at(0)
    }

    /// Look `ahead` bytes past the cursor without consuming anything.
    pub fn peek_byte_at(&self, ahead: u32) -> Result<u8, RomError> {
        self.rom.read_u8(self.offset.saturating_add(ahead))
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    pub fn position(&self) -> u32 {
        self.offset
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }
}
