pub mod config; // Player settings
pub mod engine; // Player, allocation, scheduling
pub mod io; // Audio backend seam
pub mod rom; // Cartridge image access
pub mod sequencing; // Bytecode, songs and tracks
pub mod synth; // Envelopes and voice slots
pub mod voices; // Voice tables

/// Tracks a song may declare.
pub const TRACK_COUNT: usize = 16;

pub use config::PlayerConfig;
pub use engine::{Player, PlayerSnapshot, PlayerState, TickReport, TrackFault};
pub use io::{AudioBackend, NullBackend};
pub use rom::Rom;
