//! One sequence track: a bytecode cursor, its performance state and the
//! voice slots it currently has sounding.

use arrayvec::ArrayVec;

use crate::io::AudioBackend;
use crate::rom::{Rom, RomCursor};
use crate::synth::{SlotId, TrackMix, VoicePool, DIRECT_SLOTS, GB_SLOTS};

use super::command::{decode, Command, DecodeError, RunningStatus};
use super::lfo::{Lfo, ModType};

pub const DEFAULT_VOLUME: u8 = 127;
pub const DEFAULT_BEND_RANGE: u8 = 2;

/// Slots a track can own at once: every slot in the pool.
pub const MAX_OWNED: usize = DIRECT_SLOTS + GB_SLOTS;

/// Center value of signed parameters stored with a +64 bias (PAN, BEND, TUNE).
const BIAS: i16 = 64;

fn unbias(byte: u8) -> i8 {
    (i16::from(byte.min(127)) - BIAS) as i8
}

#[derive(Debug, Clone)]
pub struct Track {
    index: usize,
    cursor: RomCursor,
    status: RunningStatus,
    delay: u8,
    voice: u8,
    volume: u8,
    pan: i8,
    bend: i8,
    bend_range: u8,
    tune: i8,
    key_shift: i8,
    priority: u8,
    lfo: Lfo,
    return_offset: Option<u32>,
    repeat_count: u8,
    stopped: bool,
    voices: ArrayVec<SlotId, MAX_OWNED>,
}

impl Track {
    /// A stopped track with no sequence.
    pub fn new(index: usize, rom: &Rom) -> Self {
        Self {
            index,
            cursor: rom.cursor(0),
            status: RunningStatus::default(),
            delay: 0,
            voice: 0,
            volume: DEFAULT_VOLUME,
            pan: 0,
            bend: 0,
            bend_range: DEFAULT_BEND_RANGE,
            tune: 0,
            key_shift: 0,
            priority: 0,
            lfo: Lfo::default(),
            return_offset: None,
            repeat_count: 0,
            stopped: true,
            voices: ArrayVec::new(),
        }
    }

    /// Reset all per-track state and start reading at `offset`.
    ///
    /// Owned voices must already have been stopped by the caller.
    pub fn init(&mut self, offset: u32) {
        let rom = self.cursor.rom().clone();
        *self = Self::new(self.index, &rom);
        self.cursor.set_offset(offset);
        self.stopped = false;
    }

    /// Reset to a stopped, empty track.
    pub fn clear(&mut self) {
        let rom = self.cursor.rom().clone();
        *self = Self::new(self.index, &rom);
    }

    /// Decode the next command, advancing the cursor.
    pub fn next_command(&mut self) -> Result<Command, DecodeError> {
        decode(&mut self.cursor, &mut self.status)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> u32 {
        self.cursor.position()
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn set_delay(&mut self, ticks: u8) {
        self.delay = ticks;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// True when the next tick should decode commands.
    pub fn is_ready(&self) -> bool {
        !self.stopped && self.delay == 0
    }

    /// The previous note command, used to tell TIE from timed notes.
    pub fn running_status(&self) -> RunningStatus {
        self.status
    }

    pub fn voice(&self) -> u8 {
        self.voice
    }

    pub fn set_voice(&mut self, voice: u8) {
        self.voice = voice;
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn pan(&self) -> i8 {
        self.pan
    }

    pub fn bend(&self) -> i8 {
        self.bend
    }

    pub fn bend_range(&self) -> u8 {
        self.bend_range
    }

    pub fn tune(&self) -> i8 {
        self.tune
    }

    pub fn key_shift(&self) -> i8 {
        self.key_shift
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    pub fn set_key_shift(&mut self, byte: u8) {
        self.key_shift = byte as i8;
    }

    /// Restart the LFO cycle on note-on.
    pub fn retrigger_lfo(&mut self) {
        self.lfo.retrigger();
    }

    // Mutators below also push the change to every owned voice.

    pub fn set_volume<B: AudioBackend>(&mut self, volume: u8, pool: &mut VoicePool<B>) {
        self.volume = volume.min(127);
        self.push_mix(pool);
    }

    pub fn set_pan<B: AudioBackend>(&mut self, byte: u8, pool: &mut VoicePool<B>) {
        self.pan = unbias(byte);
        self.push_mix(pool);
    }

    pub fn set_bend<B: AudioBackend>(&mut self, byte: u8, pool: &mut VoicePool<B>) {
        self.bend = unbias(byte);
        self.push_frequency(pool);
    }

    pub fn set_bend_range<B: AudioBackend>(&mut self, range: u8, pool: &mut VoicePool<B>) {
        self.bend_range = range;
        self.push_frequency(pool);
    }

    pub fn set_tune<B: AudioBackend>(&mut self, byte: u8, pool: &mut VoicePool<B>) {
        self.tune = unbias(byte);
        self.push_frequency(pool);
    }

    pub fn set_lfo_speed<B: AudioBackend>(&mut self, speed: u8, pool: &mut VoicePool<B>) {
        self.lfo.speed = speed;
        self.push_modulation(pool);
    }

    pub fn set_lfo_delay<B: AudioBackend>(&mut self, delay: u8, pool: &mut VoicePool<B>) {
        self.lfo.delay = delay;
        self.push_modulation(pool);
    }

    pub fn set_mod_depth<B: AudioBackend>(&mut self, depth: u8, pool: &mut VoicePool<B>) {
        self.lfo.depth = depth;
        self.push_modulation(pool);
    }

    pub fn set_mod_type<B: AudioBackend>(&mut self, kind: u8, pool: &mut VoicePool<B>) {
        self.lfo.kind = ModType::from(kind);
        self.push_modulation(pool);
    }

    /// Affects future allocation, and updates the backend hint of live voices.
    pub fn set_priority<B: AudioBackend>(&mut self, priority: u8, pool: &mut VoicePool<B>) {
        self.priority = priority;
        for &id in &self.voices {
            let (slot, backend) = pool.slot_mut(id);
            slot.push_priority(priority, backend);
        }
    }

    fn push_mix<B: AudioBackend>(&self, pool: &mut VoicePool<B>) {
        let mix = self.mix();
        for &id in &self.voices {
            let (slot, backend) = pool.slot_mut(id);
            slot.push_mix(&mix, backend);
        }
    }

    fn push_frequency<B: AudioBackend>(&self, pool: &mut VoicePool<B>) {
        let mix = self.mix();
        for &id in &self.voices {
            let (slot, backend) = pool.slot_mut(id);
            slot.push_frequency(&mix, backend);
        }
    }

    /// LFO settings can move pitch as well as volume or pan.
    fn push_modulation<B: AudioBackend>(&self, pool: &mut VoicePool<B>) {
        self.push_frequency(pool);
        self.push_mix(pool);
    }

    /// Parameters the voices need, including the current LFO output.
    pub fn mix(&self) -> TrackMix {
        TrackMix {
            volume: self.volume,
            pan: self.pan,
            bend: self.bend,
            bend_range: self.bend_range,
            tune: self.tune,
            priority: self.priority,
            modulation: self.lfo.modulation(),
        }
    }

    // Flow control.

    pub fn jump(&mut self, target: u32) {
        self.cursor.set_offset(target);
    }

    /// PATT: remember a single return address (a nested call overwrites it).
    pub fn call(&mut self, target: u32, ret: u32) {
        self.return_offset = Some(ret);
        self.cursor.set_offset(target);
    }

    /// PEND: return if a pattern call is pending, else do nothing.
    pub fn pattern_end(&mut self) {
        if let Some(ret) = self.return_offset.take() {
            self.cursor.set_offset(ret);
        }
    }

    /// REPT: jump back until the loop has run `count` times.
    pub fn repeat(&mut self, count: u8, target: u32) {
        if count == 0 {
            self.cursor.set_offset(target);
            return;
        }
        self.repeat_count += 1;
        if self.repeat_count < count {
            self.cursor.set_offset(target);
        } else {
            self.repeat_count = 0;
        }
    }

    // Owned voices.

    pub fn voices(&self) -> &[SlotId] {
        &self.voices
    }

    pub fn owns(&self, id: SlotId) -> bool {
        self.voices.contains(&id)
    }

    pub fn attach(&mut self, id: SlotId) {
        if !self.owns(id) {
            // Capacity covers every slot in the pool.
            let _ = self.voices.try_push(id);
        }
    }

    pub fn detach(&mut self, id: SlotId) {
        self.voices.retain(|owned| *owned != id);
    }

    /// EOT: release held voices started with `note`.
    pub fn release_note<B: AudioBackend>(&self, note: u8, pool: &mut VoicePool<B>) {
        for &id in &self.voices {
            let (slot, _) = pool.slot_mut(id);
            if slot.is_tied() && slot.note() == note {
                slot.trigger_release();
            }
        }
    }

    /// Release every held (TIE) voice.
    pub fn release_ties<B: AudioBackend>(&self, pool: &mut VoicePool<B>) {
        for &id in &self.voices {
            let (slot, _) = pool.slot_mut(id);
            if slot.is_tied() {
                slot.trigger_release();
            }
        }
    }

    /// Step the LFO, tick every owned voice, then count down the delay.
    pub fn tick<B: AudioBackend>(&mut self, pool: &mut VoicePool<B>) {
        self.lfo.step();
        let mix = self.mix();

        // Stopping a voice detaches it, so walk a copy.
        let owned = self.voices.clone();
        for id in owned {
            let (slot, backend) = pool.slot_mut(id);
            if slot.owner() != Some(self.index) || !slot.tick(&mix, backend) {
                self.detach(id);
            }
        }

        self.delay = self.delay.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::NullBackend;
    use crate::synth::{NoteOn, TIE};
    use crate::voices::{Adsr, LeafKind, LeafVoice, Resolved};

    fn leaf() -> Resolved {
        Resolved {
            leaf: LeafVoice {
                kind: LeafKind::DirectSound {
                    sample: 0,
                    sample_rate: 13379.0,
                    fixed: false,
                    reverse: false,
                },
                key: 60,
                pan: None,
                envelope: Adsr::new(255, 0, 255, 0),
            },
            key: 60,
            drum: false,
        }
    }

    fn start(track: &mut Track, pool: &mut VoicePool<NullBackend>, slot: u8, note: u8, duration: u8) {
        let on = NoteOn {
            track: track.index(),
            note,
            voice: leaf(),
            velocity: 100,
            duration,
            latency: 0,
        };
        let id = SlotId::Direct(slot);
        pool.play(id, on, &track.mix()).unwrap();
        track.attach(id);
    }

    fn track() -> Track {
        let mut track = Track::new(0, &Rom::new(vec![0xB1; 4]));
        track.init(0);
        track
    }

    #[test]
    fn init_sets_defaults() {
        let track = track();
        assert!(!track.is_stopped());
        assert_eq!(track.volume(), 127);
        assert_eq!(track.bend_range(), 2);
        assert_eq!(track.pan(), 0);
        assert!(track.is_ready());
        assert_eq!(track.lfo().speed, 22);
    }

    #[test]
    fn biased_parameters_are_centered() {
        let mut pool = VoicePool::new(NullBackend::new());
        let mut track = track();
        track.set_pan(0x40, &mut pool);
        assert_eq!(track.pan(), 0);
        track.set_pan(0x00, &mut pool);
        assert_eq!(track.pan(), -64);
        track.set_bend(0x7F, &mut pool);
        assert_eq!(track.bend(), 63);
        track.set_key_shift(0xF4);
        assert_eq!(track.key_shift(), -12);
    }

    #[test]
    fn tick_detaches_voices_that_finish() {
        let mut pool = VoicePool::new(NullBackend::new());
        let mut track = track();
        start(&mut track, &mut pool, 0, 60, 1);
        start(&mut track, &mut pool, 1, 62, TIE);

        for _ in 0..3 {
            track.tick(&mut pool);
        }
        assert_eq!(track.voices(), &[SlotId::Direct(1)]);
        assert!(!pool.slot(SlotId::Direct(0)).is_playing());
    }

    #[test]
    fn stolen_voices_are_dropped_on_tick() {
        let mut pool = VoicePool::new(NullBackend::new());
        let mut track = track();
        start(&mut track, &mut pool, 0, 60, TIE);
        pool.stop(SlotId::Direct(0));

        track.tick(&mut pool);
        assert!(track.voices().is_empty());
    }

    #[test]
    fn release_note_only_touches_matching_ties() {
        let mut pool = VoicePool::new(NullBackend::new());
        let mut track = track();
        start(&mut track, &mut pool, 0, 60, TIE);
        start(&mut track, &mut pool, 1, 64, TIE);
        start(&mut track, &mut pool, 2, 60, 24);

        track.release_note(60, &mut pool);
        assert!(pool.slot(SlotId::Direct(0)).is_releasing());
        assert!(!pool.slot(SlotId::Direct(1)).is_releasing());
        assert!(!pool.slot(SlotId::Direct(2)).is_releasing());
    }

    #[test]
    fn delay_counts_down_to_zero() {
        let mut pool = VoicePool::new(NullBackend::new());
        let mut track = track();
        track.set_delay(2);
        track.tick(&mut pool);
        assert_eq!(track.delay(), 1);
        track.tick(&mut pool);
        track.tick(&mut pool);
        assert_eq!(track.delay(), 0);
    }

    #[test]
    fn repeat_loops_count_times() {
        let mut track = track();
        track.jump(3);
        let mut jumps = 0;
        for _ in 0..5 {
            track.jump(3);
            track.repeat(3, 0);
            if track.position() == 0 {
                jumps += 1;
            }
        }
        // two jumps back, fall through, then the counter restarts
        assert_eq!(jumps, 4);
    }

    #[test]
    fn nested_pattern_calls_share_one_return_slot() {
        let mut track = track();
        track.call(0x10, 0x04);
        track.call(0x20, 0x14);
        track.pattern_end();
        assert_eq!(track.position(), 0x14);
        track.pattern_end();
        assert_eq!(track.position(), 0x14);
    }
}
