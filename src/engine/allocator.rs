//! Direct-sound slot selection under polyphony pressure.

/// What the allocator may know about one direct slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotView {
    pub playing: bool,
    pub releasing: bool,
    /// Priority of the track that owns the slot (0 when free).
    pub owner_priority: u8,
    pub age: u32,
}

pub trait VoiceAllocator {
    /// Pick the slot a new note at `priority` will play on.
    ///
    /// Returns an index into `slots`, or `None` only when `slots` is empty.
    fn select(&mut self, slots: &[SlotView], priority: u8) -> Option<usize>;
}

/// The cartridge driver's stealing order, first match wins:
/// 1. a free slot
/// 2. a slot in its release stage
/// 3. the slot whose owning track has the lowest priority below the new note's
/// 4. the oldest slot
///
/// Ties go to the lower slot index, so selection is deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct StealingAllocator;

impl VoiceAllocator for StealingAllocator {
    fn select(&mut self, slots: &[SlotView], priority: u8) -> Option<usize> {
        if let Some(free) = slots.iter().position(|slot| !slot.playing) {
            return Some(free);
        }

        if let Some(releasing) = slots.iter().position(|slot| slot.releasing) {
            return Some(releasing);
        }

        let lower = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.owner_priority < priority)
            .min_by_key(|(_, slot)| slot.owner_priority)
            .map(|(index, _)| index);
        if lower.is_some() {
            return lower;
        }

        // `max_by_key` keeps the last maximum; compare reversed index to keep the first.
        slots
            .iter()
            .enumerate()
            .max_by_key(|(index, slot)| (slot.age, std::cmp::Reverse(*index)))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::DIRECT_SLOTS;

    fn busy(priority: u8, age: u32) -> SlotView {
        SlotView {
            playing: true,
            releasing: false,
            owner_priority: priority,
            age,
        }
    }

    #[test]
    fn free_slot_first() {
        let mut slots = vec![busy(0, 10); DIRECT_SLOTS];
        slots[7] = SlotView::default();
        slots[3].releasing = true;
        assert_eq!(StealingAllocator.select(&slots, 0), Some(7));
    }

    #[test]
    fn releasing_slot_before_priority() {
        let mut slots = vec![busy(0, 10); DIRECT_SLOTS];
        slots[12].releasing = true;
        assert_eq!(StealingAllocator.select(&slots, 5), Some(12));
    }

    #[test]
    fn higher_priority_steals_exactly_one_slot() {
        let slots: Vec<_> = (0..DIRECT_SLOTS as u32).map(|age| busy(5, age)).collect();
        let chosen = StealingAllocator.select(&slots, 10);
        assert_eq!(chosen, Some(0));
        assert_eq!(StealingAllocator.select(&slots, 10), chosen);
    }

    #[test]
    fn lowest_owner_priority_is_taken() {
        let mut slots = vec![busy(5, 0); DIRECT_SLOTS];
        slots[20] = busy(2, 0);
        slots[21] = busy(3, 0);
        assert_eq!(StealingAllocator.select(&slots, 10), Some(20));
    }

    #[test]
    fn lower_priority_note_steals_oldest() {
        let mut slots: Vec<_> = (0..DIRECT_SLOTS as u32).map(|i| busy(5, i % 7)).collect();
        slots[17].age = 400;
        assert_eq!(StealingAllocator.select(&slots, 1), Some(17));
    }

    #[test]
    fn equal_priority_does_not_count_as_lower() {
        let mut slots = vec![busy(5, 3); DIRECT_SLOTS];
        slots[9].age = 4;
        assert_eq!(StealingAllocator.select(&slots, 5), Some(9));
    }

    #[test]
    fn oldest_tie_goes_to_first_index() {
        let slots = vec![busy(9, 8); DIRECT_SLOTS];
        assert_eq!(StealingAllocator.select(&slots, 0), Some(0));
    }

    #[test]
    fn empty_pool_selects_nothing() {
        assert_eq!(StealingAllocator.select(&[], 0), None);
    }
}
