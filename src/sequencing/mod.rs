//! Song data: the bytecode decoder, song headers, tracks and the per-track LFO.

pub mod command;
pub mod lfo;
pub mod song;
pub mod track;

pub use command::{decode, gate_extension, wait_from_cmd, Command, DecodeError, RunningStatus};
pub use lfo::{Lfo, ModType};
pub use song::{Song, SongError};
pub use track::Track;
