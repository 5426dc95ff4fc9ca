//! The seam between sequencing and sound output.
//!
//! The player never mixes audio itself. Every sounding voice slot holds one
//! opaque handle handed out by an [`AudioBackend`], and all pitch, pan and
//! level changes are pushed through it. Rendering is requested once at the
//! end of every tick, on the tick thread, so sequencing stays sample-aligned
//! with whatever the backend produces.

use log::trace;
use thiserror::Error;

use crate::voices::GbKind;

/// Which hardware channel family a voice is played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceGroup {
    /// One of the 28 sample-playback slots.
    Direct(u8),
    /// The dedicated slot of one programmable sound generator channel.
    Gb(GbKind),
}

/// What a voice slot should sound like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRef {
    /// PCM sample; `header` is the image offset of its 16-byte header.
    Pcm { header: u32, reverse: bool },
    /// Pulse channel with a duty-cycle index and optional frequency sweep.
    Square { duty: u8, sweep: Option<u8> },
    /// 4-bit wave RAM pattern at an image offset.
    Wave { offset: u32 },
    /// LFSR noise with a width/period selector.
    Noise { period: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("no free output handle")]
    NoHandle,

    #[error("sample {0:?} is not available")]
    MissingSample(SampleRef),
}

/// Output collaborator driven by the player.
///
/// Handles are plain identifiers; the backend owns whatever state sits
/// behind them. A handle passed to [`AudioBackend::stop`] is never used again.
pub trait AudioBackend {
    type Handle: Copy + Eq + std::fmt::Debug;

    fn play(&mut self, group: VoiceGroup, sample: SampleRef) -> Result<Self::Handle, BackendError>;

    fn set_frequency(&mut self, handle: Self::Handle, hz: f32);

    /// `pan` is in `[-1, 1]`, left to right.
    fn set_pan(&mut self, handle: Self::Handle, pan: f32);

    /// `volume` is in `[0, 1]`.
    fn set_volume(&mut self, handle: Self::Handle, volume: f32);

    fn set_priority(&mut self, handle: Self::Handle, priority: u8);

    fn stop(&mut self, handle: Self::Handle);

    /// Produce one tick's worth of audio.
    fn render(&mut self);
}

/// A backend that produces no sound; it only hands out handles and traces calls.
#[derive(Debug, Default)]
pub struct NullBackend {
    next_handle: u32,
    live: usize,
    rendered: u64,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles currently playing.
    pub fn live_handles(&self) -> usize {
        self.live
    }

    /// Number of render requests received.
    pub fn rendered_ticks(&self) -> u64 {
        self.rendered
    }
}

impl AudioBackend for NullBackend {
    type Handle = u32;

    fn play(&mut self, group: VoiceGroup, sample: SampleRef) -> Result<u32, BackendError> {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.live += 1;
        trace!("play {:?} {:?} -> #{}", group, sample, handle);
        Ok(handle)
    }

    fn set_frequency(&mut self, handle: u32, hz: f32) {
        trace!("#{} frequency {:.2}", handle, hz);
    }

    fn set_pan(&mut self, handle: u32, pan: f32) {
        trace!("#{} pan {:.2}", handle, pan);
    }

    fn set_volume(&mut self, handle: u32, volume: f32) {
        trace!("#{} volume {:.3}", handle, volume);
    }

    fn set_priority(&mut self, handle: u32, priority: u8) {
        trace!("#{} priority {}", handle, priority);
    }

    fn stop(&mut self, handle: u32) {
        self.live = self.live.saturating_sub(1);
        trace!("#{} stop", handle);
    }

    fn render(&mut self) {
        self.rendered += 1;
    }
}
