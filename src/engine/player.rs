/*
Player
======

Owns everything a song needs while it plays: the ROM, sixteen tracks, the
voice pool (and through it the audio backend) and the voice table of the
current song.

One call to `tick()` is one driver frame:

  for each track, in index order:
      while the track is running and its delay is zero:
          decode and execute one command
      tick the track (LFO, owned voices, delay countdown)
  render
  if every track has stopped and nothing is sounding: SongEnded

Everything happens on the caller's thread. A track that loops forever
without waiting is cut off by the watchdog and stopped; a track that hits
undecodable data is stopped. Either way the fault is reported in the
`TickReport` and the other tracks keep playing.
*/

use arrayvec::ArrayVec;
use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::config::{clamp_tempo, PlayerConfig};
use crate::io::AudioBackend;
use crate::rom::{Rom, RomError};
use crate::sequencing::command::TIE as TIE_CMD;
use crate::sequencing::{gate_extension, wait_from_cmd, Command, DecodeError, Song, SongError, Track};
use crate::synth::{NoteOn, SlotId, VoicePool, DIRECT_SLOTS, TIE};
use crate::TRACK_COUNT;

use crate::voices::VoiceTable;

use super::allocator::{SlotView, StealingAllocator, VoiceAllocator};

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// A condition that stopped one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackFault {
    #[error("track {track}: unknown opcode 0x{opcode:02X} at 0x{offset:06X}")]
    UnknownOpcode { track: usize, offset: u32, opcode: u8 },

    #[error("track {track}: data byte 0x{byte:02X} at 0x{offset:06X} with no running status")]
    DanglingData { track: usize, offset: u32, byte: u8 },

    #[error("track {track}: more than {limit} commands without a wait, stopped at 0x{offset:06X}")]
    Watchdog { track: usize, offset: u32, limit: u32 },

    #[error("track {track}: {source}")]
    Rom {
        track: usize,
        #[source]
        source: RomError,
    },
}

impl TrackFault {
    fn decode(track: usize, offset: u32, error: DecodeError) -> Self {
        match error {
            DecodeError::UnknownOpcode(opcode) => TrackFault::UnknownOpcode { track, offset, opcode },
            DecodeError::DanglingData(byte) => TrackFault::DanglingData { track, offset, byte },
            DecodeError::Rom(source) => TrackFault::Rom { track, source },
        }
    }

    pub fn track(&self) -> usize {
        match *self {
            TrackFault::UnknownOpcode { track, .. }
            | TrackFault::DanglingData { track, .. }
            | TrackFault::Watchdog { track, .. }
            | TrackFault::Rom { track, .. } => track,
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tracks stopped by a fault during this tick.
    pub faults: ArrayVec<TrackFault, TRACK_COUNT>,
    /// Set on the tick the song finished; never set twice for one playthrough.
    pub song_ended: bool,
}

pub struct Player<B: AudioBackend> {
    rom: Rom,
    config: PlayerConfig,
    song: Option<Song>,
    tracks: Vec<Track>,
    pool: VoicePool<B>,
    voices: VoiceTable,
    allocator: Box<dyn VoiceAllocator + Send>,
    tempo: u16,
    state: PlayerState,
    ticks: u64,
}

impl<B: AudioBackend> Player<B> {
    pub fn new(rom: Rom, backend: B, config: PlayerConfig) -> Self {
        let tracks = (0..TRACK_COUNT).map(|index| Track::new(index, &rom)).collect();
        Self {
            rom,
            song: None,
            tracks,
            pool: VoicePool::new(backend),
            voices: VoiceTable::empty(),
            allocator: Box::new(StealingAllocator),
            tempo: clamp_tempo(config.default_tempo),
            state: PlayerState::Stopped,
            ticks: 0,
            config,
        }
    }

    /// Replace the direct-slot stealing policy.
    pub fn with_allocator(mut self, allocator: Box<dyn VoiceAllocator + Send>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Load the song whose header is at image offset `header` and start it.
    pub fn load_song(&mut self, header: u32) -> Result<(), SongError> {
        let song = Song::read(&self.rom, header)?;
        self.voices = VoiceTable::load(&self.rom, song.voice_group);
        info!(
            "loaded song at 0x{:06X}: {} tracks, voice group 0x{:06X}, priority {}",
            header,
            song.num_tracks(),
            song.voice_group,
            song.priority
        );
        self.song = Some(song);
        self.restart();
        Ok(())
    }

    /// Load song `index` from the song table at `table` and start it.
    pub fn load_song_from_table(&mut self, table: u32, index: u32) -> Result<(), SongError> {
        let song = Song::from_table(&self.rom, table, index)?;
        self.load_song(song.header)
    }

    /// Rewind the current song to its start and play.
    pub fn restart(&mut self) {
        self.silence();
        let Some(song) = &self.song else {
            debug!("restart with no song loaded");
            return;
        };

        for (index, track) in self.tracks.iter_mut().enumerate() {
            match song.tracks.get(index) {
                Some(&offset) => track.init(offset),
                None => track.clear(),
            }
        }
        self.tempo = clamp_tempo(self.config.default_tempo);
        self.ticks = 0;
        self.state = PlayerState::Playing;
    }

    /// Resume from pause, or start the loaded song over if stopped.
    pub fn play(&mut self) {
        match self.state {
            PlayerState::Paused => {
                info!("resumed");
                self.state = PlayerState::Playing;
            }
            PlayerState::Stopped => self.restart(),
            PlayerState::Playing => {}
        }
    }

    /// Freeze sequencing. Voices keep their state until resumed.
    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            info!("paused");
            self.state = PlayerState::Paused;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlayerState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    /// Silence everything and stop all tracks.
    pub fn stop(&mut self) {
        self.silence();
        for track in &mut self.tracks {
            track.clear();
        }
        if self.state != PlayerState::Stopped {
            info!("stopped");
        }
        self.state = PlayerState::Stopped;
    }

    /// Hard-stop every slot.
    fn silence(&mut self) {
        for id in VoicePool::<B>::ids() {
            self.stop_slot(id);
        }
    }

    /// Run one driver frame. Does nothing unless playing.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.state != PlayerState::Playing {
            return report;
        }

        for index in 0..self.tracks.len() {
            if let Err(fault) = self.run_track(index) {
                warn!("{}", fault);
                self.tracks[index].release_ties(&mut self.pool);
                self.tracks[index].stop();
                report.faults.push(fault);
            }
            self.tracks[index].tick(&mut self.pool);
        }

        self.pool.render();
        self.ticks += 1;

        if self.tracks.iter().all(Track::is_stopped) && self.pool.playing() == 0 {
            info!("song ended after {} ticks", self.ticks);
            self.state = PlayerState::Stopped;
            report.song_ended = true;
        }
        report
    }

    /// Execute commands on one track until it waits or stops.
    fn run_track(&mut self, index: usize) -> Result<(), TrackFault> {
        let limit = self.config.watchdog_limit;
        let mut executed = 0;
        while self.tracks[index].is_ready() {
            if executed >= limit {
                return Err(TrackFault::Watchdog {
                    track: index,
                    offset: self.tracks[index].position(),
                    limit,
                });
            }
            executed += 1;
            self.execute_next(index)?;
        }
        Ok(())
    }

    /// Decode and apply exactly one command on track `index`.
    pub fn execute_next(&mut self, index: usize) -> Result<(), TrackFault> {
        let offset = self.tracks[index].position();
        let command = self.tracks[index]
            .next_command()
            .map_err(|error| TrackFault::decode(index, offset, error))?;
        trace!("track {} @0x{:06X}: {:?}", index, offset, command);

        let pool = &mut self.pool;
        let track = &mut self.tracks[index];
        match command {
            Command::Wait(ticks) => track.set_delay(ticks),
            Command::Fine => {
                track.release_ties(pool);
                track.stop();
            }
            Command::Goto(target) => track.jump(target),
            Command::Patt { target, ret } => track.call(target, ret),
            Command::Pend => track.pattern_end(),
            Command::Repeat { count, target } => track.repeat(count, target),
            Command::MemAcc(_) | Command::Xcmd(_) => {}
            Command::Priority(priority) => track.set_priority(priority, pool),
            Command::Tempo(value) => self.tempo = clamp_tempo(u16::from(value) * 2),
            Command::KeyShift(shift) => track.set_key_shift(shift),
            Command::Voice(voice) => track.set_voice(voice),
            Command::Volume(volume) => track.set_volume(volume, pool),
            Command::Pan(pan) => track.set_pan(pan, pool),
            Command::Bend(bend) => track.set_bend(bend, pool),
            Command::BendRange(range) => track.set_bend_range(range, pool),
            Command::LfoSpeed(speed) => track.set_lfo_speed(speed, pool),
            Command::LfoDelay(delay) => track.set_lfo_delay(delay, pool),
            Command::ModDepth(depth) => track.set_mod_depth(depth, pool),
            Command::ModType(kind) => track.set_mod_type(kind, pool),
            Command::Tune(tune) => track.set_tune(tune, pool),
            Command::EndOfTie(note) => track.release_note(note, pool),
            Command::Note {
                cmd,
                note,
                velocity,
                extra,
            } => self.play_note(index, cmd, note, velocity, extra),
        }
        Ok(())
    }

    /// Start a note on track `index`. Unresolvable voices and backend
    /// failures leave the note silent.
    fn play_note(&mut self, index: usize, cmd: u8, note: u8, velocity: u8, extra: Option<u8>) {
        let track = &self.tracks[index];
        let key = (i16::from(note) + i16::from(track.key_shift())).clamp(0, 127) as u8;
        let resolved = match self.voices.resolve(track.voice(), key) {
            Ok(resolved) => resolved,
            Err(error) => {
                debug!("track {}: note {} on voice {} dropped: {}", index, key, track.voice(), error);
                return;
            }
        };

        let gate = extra.map(gate_extension).unwrap_or(0);
        let (duration, latency) = if cmd == TIE_CMD {
            (TIE, gate)
        } else {
            (wait_from_cmd(TIE_CMD, cmd).saturating_add(gate).min(TIE - 1), 0)
        };

        let id = match resolved.leaf.kind.gb_kind() {
            Some(kind) => SlotId::Gb(kind),
            None => {
                let views = self.slot_views();
                match self.allocator.select(&views, track.priority()) {
                    Some(slot) => SlotId::Direct(slot as u8),
                    None => return,
                }
            }
        };

        if self.pool.slot(id).is_playing() {
            debug!("track {}: taking {:?} from track {:?}", index, id, self.pool.slot(id).owner());
        }
        self.stop_slot(id);

        let track = &mut self.tracks[index];
        track.retrigger_lfo();
        let on = NoteOn {
            track: index,
            note,
            voice: resolved,
            velocity,
            duration,
            latency,
        };
        match self.pool.play(id, on, &track.mix()) {
            Ok(()) => track.attach(id),
            Err(error) => warn!("track {}: note {} silenced: {}", index, key, error),
        }
    }

    fn slot_views(&self) -> ArrayVec<SlotView, DIRECT_SLOTS> {
        self.pool
            .direct()
            .iter()
            .map(|slot| SlotView {
                playing: slot.is_playing(),
                releasing: slot.is_releasing(),
                owner_priority: slot
                    .owner()
                    .and_then(|owner| self.tracks.get(owner))
                    .map_or(0, Track::priority),
                age: slot.age(),
            })
            .collect()
    }

    /// Stop a slot and detach it from whichever track owned it.
    fn stop_slot(&mut self, id: SlotId) {
        if let Some(owner) = self.pool.stop(id) {
            if let Some(track) = self.tracks.get_mut(owner) {
                track.detach(id);
            }
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn tempo(&self) -> u16 {
        self.tempo
    }

    /// Ticks since the song started.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn pool(&self) -> &VoicePool<B> {
        &self.pool
    }

    pub fn backend(&self) -> &B {
        self.pool.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.pool.backend_mut()
    }

    pub fn voice_table(&self) -> &VoiceTable {
        &self.voices
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }
}
