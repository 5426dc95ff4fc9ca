//! The fixed voice slots: 28 direct-sound slots shared by all tracks and one
//! dedicated slot per GB channel. The pool also owns the audio backend, since
//! every slot operation ends in a backend call.

use crate::io::{AudioBackend, BackendError, VoiceGroup};
use crate::voices::GbKind;

use super::voice::{Instrument, NoteOn};
use super::TrackMix;

pub const DIRECT_SLOTS: usize = 28;
pub const GB_SLOTS: usize = 4;

/// Address of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    Direct(u8),
    Gb(GbKind),
}

pub struct VoicePool<B: AudioBackend> {
    direct: Vec<Instrument<B::Handle>>,
    gb: [Instrument<B::Handle>; GB_SLOTS],
    backend: B,
}

impl<B: AudioBackend> VoicePool<B> {
    pub fn new(backend: B) -> Self {
        let direct = (0..DIRECT_SLOTS as u8)
            .map(|i| Instrument::new(VoiceGroup::Direct(i)))
            .collect();
        let gb = GbKind::ALL.map(|kind| Instrument::new(VoiceGroup::Gb(kind)));

        Self { direct, gb, backend }
    }

    pub fn slot(&self, id: SlotId) -> &Instrument<B::Handle> {
        match id {
            SlotId::Direct(i) => &self.direct[i as usize],
            SlotId::Gb(kind) => &self.gb[kind.index()],
        }
    }

    /// A slot together with the backend, for operations that need both.
    pub fn slot_mut(&mut self, id: SlotId) -> (&mut Instrument<B::Handle>, &mut B) {
        let slot = match id {
            SlotId::Direct(i) => &mut self.direct[i as usize],
            SlotId::Gb(kind) => &mut self.gb[kind.index()],
        };
        (slot, &mut self.backend)
    }

    /// The direct-sound slots, in index order.
    pub fn direct(&self) -> &[Instrument<B::Handle>] {
        &self.direct
    }

    pub fn gb(&self) -> &[Instrument<B::Handle>; GB_SLOTS] {
        &self.gb
    }

    /// Every slot id, direct slots first.
    pub fn ids() -> impl Iterator<Item = SlotId> {
        (0..DIRECT_SLOTS as u8)
            .map(SlotId::Direct)
            .chain(GbKind::ALL.into_iter().map(SlotId::Gb))
    }

    /// Start a note on `id`, which must be free.
    pub fn play(&mut self, id: SlotId, on: NoteOn, mix: &TrackMix) -> Result<(), BackendError> {
        let (slot, backend) = self.slot_mut(id);
        slot.play(on, mix, backend)
    }

    /// Hard-stop a slot, returning the track that owned it.
    pub fn stop(&mut self, id: SlotId) -> Option<usize> {
        let (slot, backend) = self.slot_mut(id);
        slot.stop(backend)
    }

    /// Number of slots currently playing.
    pub fn playing(&self) -> usize {
        self.direct
            .iter()
            .chain(self.gb.iter())
            .filter(|slot| slot.is_playing())
            .count()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Ask the backend for one tick of audio.
    pub fn render(&mut self) {
        self.backend.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::NullBackend;

    #[test]
    fn pool_has_fixed_capacity() {
        let pool = VoicePool::new(NullBackend::new());
        assert_eq!(pool.direct().len(), DIRECT_SLOTS);
        assert_eq!(VoicePool::<NullBackend>::ids().count(), DIRECT_SLOTS + GB_SLOTS);
        assert_eq!(pool.playing(), 0);
    }

    #[test]
    fn gb_slots_map_one_to_one() {
        let pool = VoicePool::new(NullBackend::new());
        for kind in GbKind::ALL {
            assert_eq!(pool.slot(SlotId::Gb(kind)).group(), VoiceGroup::Gb(kind));
        }
    }
}
