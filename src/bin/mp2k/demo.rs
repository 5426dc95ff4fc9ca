//! A short built-in song, assembled in memory, for trying the player
//! without a cartridge image.

use mp2k_player::rom::builder::RomBuilder;
use mp2k_player::sequencing::command::*;
use mp2k_player::voices::{Adsr, TYPE_SQUARE1};
use mp2k_player::Rom;

const LEAD: u8 = 0;
const BASS: u8 = 1;
const HATS: u8 = 2;

/// Returns the image and the offset of the song header.
pub fn build() -> (Rom, u32) {
    let mut rom = RomBuilder::new();
    let sample = rom.pcm_sample(13_379, 256);
    rom.align(4);

    let group = rom.position();
    rom.bytes(&RomBuilder::direct_sound_voice(60, None, sample, Adsr::new(200, 240, 180, 200)));
    rom.bytes(&RomBuilder::square_voice(TYPE_SQUARE1, 2, Adsr::new(0, 2, 10, 4)));
    rom.bytes(&RomBuilder::noise_voice(0, Adsr::new(0, 1, 0, 1)));

    // Lead: a held note with vibrato, then a four-note figure, twice.
    let lead = rom.position();
    rom.bytes(&[TEMPO, 60, VOICE, LEAD, VOL, 110, PAN, 0x38, MOD, 12, LFODL, 12, LFOS, 30]);
    let lead_loop = rom.position();
    rom.bytes(&[0xCF, 72, 110, 0x98, EOT, 0x90]);
    rom.bytes(&[0xDB, 76, 100, 0x8C, 0xDB, 79, 0x8C, 0xDB, 76, 0x8C, 0xDB, 74, 0x8C]);
    rom.bytes(&[REPT, 2]);
    rom.pointer(lead_loop);
    rom.bytes(&[FINE]);

    // Bass: square channel, root and fifth, bent up into the repeat.
    let bass = rom.position();
    rom.bytes(&[VOICE, BASS, VOL, 90, PAN, 0x48, BENDR, 2]);
    let bass_loop = rom.position();
    for &(note, wait) in &[(48u8, 0x98u8), (55, 0x98), (48, 0x98), (55, 0x8C)] {
        rom.bytes(&[0xE3, note, 100, wait]);
    }
    rom.bytes(&[BEND, 0x50, 0x8C, BEND, 0x40, REPT, 2]);
    rom.pointer(bass_loop);
    rom.bytes(&[FINE]);

    // Hats: noise on eighths through a pattern call.
    let hats_pattern = rom.position();
    rom.bytes(&[0xD2, 60, 70, 0x8C, 0xD2, 60, 40, 0x8C, PEND]);
    let hats = rom.position();
    rom.bytes(&[VOICE, HATS, VOL, 70]);
    for _ in 0..8 {
        rom.bytes(&[PATT]);
        rom.pointer(hats_pattern);
    }
    rom.bytes(&[FINE]);

    let header = rom.song_header(group, 0, &[lead, bass, hats]);
    (rom.build(), header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2k_player::{NullBackend, Player, PlayerConfig, PlayerState};

    #[test]
    fn demo_plays_to_the_end_without_faults() {
        let (rom, header) = build();
        let mut player = Player::new(rom, NullBackend::new(), PlayerConfig::default());
        player.load_song(header).unwrap();

        let mut ended = false;
        for _ in 0..2_000 {
            let report = player.tick();
            assert!(report.faults.is_empty(), "{:?}", report.faults);
            if report.song_ended {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(player.state(), PlayerState::Stopped);
        assert_eq!(player.tempo(), 120);
    }
}
