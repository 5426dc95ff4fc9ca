/*
Sequence Bytecode
=================

Each track is a stream of one-byte opcodes with inline arguments.

  0x00-0x7F   data byte; only valid under running status (see below)
  0x80-0xB0   wait; the opcode indexes the length table
  0xB1-0xCE   control commands with fixed arguments
  0xCF        TIE: note held until EOT
  0xD0-0xFF   timed note; the opcode indexes the length table from 0xCF

Running status
--------------

Every control command except the flow-control group (FINE, GOTO, PATT,
PEND, REPT) and every note command is remembered as the track's previous
command. A data byte in opcode position repeats that command with the data
byte as its first argument:

  BE 40 60       VOL 0x40, then VOL 0x60
  D3 3C 64 3E    N04 C4 v100, then N04 D4 (velocity carried over)

Note arguments
--------------

A note takes up to three data bytes: key, velocity and a gate-time extra.
How many are present is found by peeking ahead for the first byte >= 0x80;
missing key or velocity repeat the previous note's values.
*/

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::rom::{RomCursor, RomError};

pub const WAIT_BASE: u8 = 0x80;
pub const WAIT_MAX: u8 = 0xB0;

pub const FINE: u8 = 0xB1;
pub const GOTO: u8 = 0xB2;
pub const PATT: u8 = 0xB3;
pub const PEND: u8 = 0xB4;
pub const REPT: u8 = 0xB5;
pub const MEMACC: u8 = 0xB9;
pub const PRIO: u8 = 0xBA;
pub const TEMPO: u8 = 0xBB;
pub const KEYSH: u8 = 0xBC;
pub const VOICE: u8 = 0xBD;
pub const VOL: u8 = 0xBE;
pub const PAN: u8 = 0xBF;
pub const BEND: u8 = 0xC0;
pub const BENDR: u8 = 0xC1;
pub const LFOS: u8 = 0xC2;
pub const LFODL: u8 = 0xC3;
pub const MOD: u8 = 0xC4;
pub const MODT: u8 = 0xC5;
pub const TUNE: u8 = 0xC8;
pub const XCMD: u8 = 0xCD;
pub const EOT: u8 = 0xCE;
pub const TIE: u8 = 0xCF;

/// Tick lengths for the 49 wait opcodes (and, offset by 0xCF, the note opcodes).
/// Linear up to 24, then steps of 4, 4, 2, 2 up to 96.
const LENGTHS: [u8; 49] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
    28, 32, 34, 36, 40, 44, 46, 48, 52, 56, 58, 60, 64, 68, 70, 72, 76, 80, 82, 84, 88, 92, 94,
    96,
];

/// Length in ticks of opcode `cmd` counted from `base`.
///
/// `base` is [`WAIT_BASE`] for waits and [`TIE`] for note durations. Opcodes
/// past the end of the table saturate at the longest length.
pub fn wait_from_cmd(base: u8, cmd: u8) -> u8 {
    let index = cmd.saturating_sub(base) as usize;
    LENGTHS[index.min(LENGTHS.len() - 1)]
}

/// Extra ticks encoded by a note's third data byte.
pub fn gate_extension(extra: u8) -> u8 {
    wait_from_cmd(WAIT_BASE, WAIT_BASE.saturating_add(extra))
}

/// Per-track decoder memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningStatus {
    /// Last remembered opcode, 0 when none.
    pub cmd: u8,
    pub note: u8,
    pub velocity: u8,
}

impl Default for RunningStatus {
    fn default() -> Self {
        Self {
            cmd: 0,
            note: 60,
            velocity: 127,
        }
    }
}

/// One decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Wait(u8),
    Fine,
    Goto(u32),
    /// Call a pattern; `ret` is where PEND resumes.
    Patt { target: u32, ret: u32 },
    Pend,
    Repeat { count: u8, target: u32 },
    MemAcc([u8; 3]),
    Priority(u8),
    Tempo(u8),
    KeyShift(u8),
    Voice(u8),
    Volume(u8),
    Pan(u8),
    Bend(u8),
    BendRange(u8),
    LfoSpeed(u8),
    LfoDelay(u8),
    ModDepth(u8),
    ModType(u8),
    Tune(u8),
    Xcmd([u8; 2]),
    EndOfTie(u8),
    Note {
        cmd: u8,
        note: u8,
        velocity: u8,
        extra: Option<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("data byte 0x{0:02X} with no running status")]
    DanglingData(u8),

    #[error(transparent)]
    Rom(#[from] RomError),
}

/// Argument source: an already-consumed running-status byte, then the stream.
struct Args<'a> {
    first: Option<u8>,
    cursor: &'a mut RomCursor,
}

impl Args<'_> {
    fn byte(&mut self) -> Result<u8, RomError> {
        match self.first.take() {
            Some(byte) => Ok(byte),
            None => self.cursor.read_byte(),
        }
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], RomError> {
        let mut out = [0u8; N];
        for byte in out.iter_mut() {
            *byte = self.byte()?;
        }
        Ok(out)
    }
}

/// Decode the command at the cursor, updating running status.
pub fn decode(cursor: &mut RomCursor, status: &mut RunningStatus) -> Result<Command, DecodeError> {
    let byte = cursor.read_byte()?;
    match byte {
        0x00..=0x7F => match status.cmd {
            0 => Err(DecodeError::DanglingData(byte)),
            cmd => decode_with(cmd, Some(byte), cursor, status),
        },
        WAIT_BASE..=WAIT_MAX => Ok(Command::Wait(wait_from_cmd(WAIT_BASE, byte))),
        cmd => decode_with(cmd, None, cursor, status),
    }
}

fn decode_with(
    cmd: u8,
    first: Option<u8>,
    cursor: &mut RomCursor,
    status: &mut RunningStatus,
) -> Result<Command, DecodeError> {
    // Flow control never becomes running status.
    match cmd {
        FINE => return Ok(Command::Fine),
        GOTO => return Ok(Command::Goto(cursor.read_pointer()?)),
        PATT => {
            let target = cursor.read_pointer()?;
            return Ok(Command::Patt {
                target,
                ret: cursor.position(),
            });
        }
        PEND => return Ok(Command::Pend),
        REPT => {
            let count = cursor.read_byte()?;
            let target = cursor.read_pointer()?;
            return Ok(Command::Repeat { count, target });
        }
        _ => {}
    }

    if cmd >= TIE {
        return decode_note(cmd, first, cursor, status);
    }

    let mut args = Args { first, cursor };
    let command = match cmd {
        MEMACC => Command::MemAcc(args.bytes()?),
        PRIO => Command::Priority(args.byte()?),
        TEMPO => Command::Tempo(args.byte()?),
        KEYSH => Command::KeyShift(args.byte()?),
        VOICE => Command::Voice(args.byte()?),
        VOL => Command::Volume(args.byte()?),
        PAN => Command::Pan(args.byte()?),
        BEND => Command::Bend(args.byte()?),
        BENDR => Command::BendRange(args.byte()?),
        LFOS => Command::LfoSpeed(args.byte()?),
        LFODL => Command::LfoDelay(args.byte()?),
        MOD => Command::ModDepth(args.byte()?),
        MODT => Command::ModType(args.byte()?),
        TUNE => Command::Tune(args.byte()?),
        XCMD => Command::Xcmd(args.bytes()?),
        EOT => {
            let note = match args.first.take() {
                Some(note) => note,
                None if is_data(args.cursor.peek_byte()) => args.cursor.read_byte()?,
                None => status.note,
            };
            status.note = note;
            Command::EndOfTie(note)
        }
        other => return Err(DecodeError::UnknownOpcode(other)),
    };

    status.cmd = cmd;
    Ok(command)
}

/// A peeked byte is an argument if it exists and is below 0x80.
fn is_data(peeked: Result<u8, RomError>) -> bool {
    matches!(peeked, Ok(byte) if byte < 0x80)
}

fn decode_note(
    cmd: u8,
    first: Option<u8>,
    cursor: &mut RomCursor,
    status: &mut RunningStatus,
) -> Result<Command, DecodeError> {
    let mut args = ArrayVec::<u8, 3>::new();
    args.extend(first);

    // Count the data bytes that follow before consuming any.
    let mut ahead = 0;
    while args.len() + ahead < 3 && is_data(cursor.peek_byte_at(ahead as u32)) {
        ahead += 1;
    }
    for _ in 0..ahead {
        args.push(cursor.read_byte()?);
    }

    let note = args.first().copied().unwrap_or(status.note);
    let velocity = args.get(1).copied().unwrap_or(status.velocity);
    let extra = args.get(2).copied();

    status.cmd = cmd;
    status.note = note;
    status.velocity = velocity;

    Ok(Command::Note {
        cmd,
        note,
        velocity,
        extra,
    })
}
