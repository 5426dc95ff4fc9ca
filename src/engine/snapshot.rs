//! Read-only projection of player state for displays.
//!
//! A snapshot is an owned copy; building one never touches sequencer state,
//! so it can be handed to another thread.

use arrayvec::ArrayVec;

use crate::io::AudioBackend;
use crate::sequencing::track::MAX_OWNED;
use crate::sequencing::{ModType, Track};
use crate::synth::{EnvelopeStage, VoicePool};
use crate::TRACK_COUNT;

use super::player::{Player, PlayerState};

/// One sounding voice as seen from its track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundingNote {
    pub note: u8,
    pub stage: EnvelopeStage,
    /// Output level after envelope, velocity and track volume, 0..=1.
    pub level: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackSnapshot {
    pub index: usize,
    pub position: u32,
    pub delay: u8,
    pub stopped: bool,
    pub voice: u8,
    pub volume: u8,
    pub pan: i8,
    pub bend: i8,
    pub bend_range: u8,
    pub priority: u8,
    pub mod_depth: u8,
    pub mod_type: ModType,
    pub notes: ArrayVec<SoundingNote, MAX_OWNED>,
}

impl TrackSnapshot {
    pub fn capture<B: AudioBackend>(track: &Track, pool: &VoicePool<B>) -> Self {
        let mix = track.mix();
        let notes = track
            .voices()
            .iter()
            .map(|&id| pool.slot(id))
            .filter(|slot| slot.is_playing())
            .map(|slot| SoundingNote {
                note: slot.note(),
                stage: slot.stage(),
                level: slot.volume(&mix),
            })
            .collect();

        Self {
            index: track.index(),
            position: track.position(),
            delay: track.delay(),
            stopped: track.is_stopped(),
            voice: track.voice(),
            volume: track.volume(),
            pan: track.pan(),
            bend: track.bend(),
            bend_range: track.bend_range(),
            priority: track.priority(),
            mod_depth: track.lfo().depth,
            mod_type: track.lfo().kind,
            notes,
        }
    }

    /// Loudest sounding note, 0 when silent.
    pub fn peak_level(&self) -> f32 {
        self.notes.iter().map(|note| note.level).fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub tempo: u16,
    pub ticks: u64,
    /// Header offset of the loaded song.
    pub song: Option<u32>,
    pub voices_playing: usize,
    /// Only the tracks the song declares.
    pub tracks: ArrayVec<TrackSnapshot, TRACK_COUNT>,
}

impl PlayerSnapshot {
    pub fn capture<B: AudioBackend>(player: &Player<B>) -> Self {
        let declared = player.song().map_or(0, |song| song.num_tracks());
        let tracks = player
            .tracks()
            .iter()
            .take(declared)
            .map(|track| TrackSnapshot::capture(track, player.pool()))
            .collect();

        Self {
            state: player.state(),
            tempo: player.tempo(),
            ticks: player.ticks(),
            song: player.song().map(|song| song.header),
            voices_playing: player.pool().playing(),
            tracks,
        }
    }
}

impl<B: AudioBackend> Player<B> {
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::io::NullBackend;
    use crate::rom::builder::RomBuilder;
    use crate::sequencing::command::{FINE, VOL};
    use crate::voices::Adsr;

    #[test]
    fn snapshot_reports_sounding_notes_per_track() {
        let mut rom = RomBuilder::new();
        let sample = rom.pcm_sample(8000, 8);
        let group = rom.bytes(&RomBuilder::direct_sound_voice(60, None, sample, Adsr::new(255, 0, 255, 0)));
        let t0 = rom.bytes(&[VOL, 64, 0xCF, 67, 127, 0x81, 0x81, FINE]);
        let t1 = rom.bytes(&[FINE]);
        let header = rom.song_header(group, 0, &[t0, t1]);

        let mut player = Player::new(rom.build(), NullBackend::new(), PlayerConfig::default());
        player.load_song(header).unwrap();
        player.tick();

        let snapshot = player.snapshot();
        assert_eq!(snapshot.state, PlayerState::Playing);
        assert_eq!(snapshot.tracks.len(), 2);
        assert_eq!(snapshot.voices_playing, 1);

        let track = &snapshot.tracks[0];
        assert_eq!(track.volume, 64);
        assert_eq!(track.delay, 0);
        assert_eq!(track.notes.len(), 1);
        assert_eq!(track.notes[0].note, 67);
        assert!(track.peak_level() > 0.49 && track.peak_level() < 0.51);
        assert!(snapshot.tracks[1].stopped);
    }

    #[test]
    fn snapshot_without_song_is_empty() {
        let player = Player::new(RomBuilder::new().build(), NullBackend::new(), PlayerConfig::default());
        let snapshot = player.snapshot();
        assert_eq!(snapshot.song, None);
        assert!(snapshot.tracks.is_empty());
        assert_eq!(snapshot.state, PlayerState::Stopped);
    }
}
