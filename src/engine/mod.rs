//! Playback engine: the tick-driven player, slot allocation, display
//! snapshots and the background tick thread.

pub mod allocator;
pub mod player;
#[cfg(feature = "rtrb")]
pub mod scheduler;
pub mod snapshot;

pub use allocator::{SlotView, StealingAllocator, VoiceAllocator};
pub use player::{Player, PlayerState, TickReport, TrackFault};
#[cfg(feature = "rtrb")]
pub use scheduler::{tick_interval, PlayerEvent, Scheduler, TransportCommand};
pub use snapshot::{PlayerSnapshot, SoundingNote, TrackSnapshot};
