//! Wires a player to the tick thread and picks a front end.

use std::thread;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use tracing::{info, warn};

use mp2k_player::engine::{PlayerEvent, Scheduler};
use mp2k_player::sequencing::Song;
use mp2k_player::{NullBackend, Player, PlayerConfig, Rom};

use super::ui::UiApp;

/// How the song to play was named on the command line.
#[derive(Debug, Clone, Copy)]
pub enum SongSelection {
    Header(u32),
    Table { table: u32, index: u32 },
}

pub struct App {
    scheduler: Scheduler<NullBackend>,
    song: Song,
}

impl App {
    /// Load the song, then hand the player to the tick thread.
    pub fn new(rom: Rom, config: PlayerConfig, selection: SongSelection) -> EyreResult<Self> {
        let mut player = Player::new(rom, NullBackend::new(), config);
        match selection {
            SongSelection::Header(header) => player
                .load_song(header)
                .wrap_err_with(|| format!("no song header at 0x{header:06X}"))?,
            SongSelection::Table { table, index } => player
                .load_song_from_table(table, index)
                .wrap_err_with(|| format!("song {index} of table 0x{table:06X} is unreadable"))?,
        }
        let song = player.song().cloned().ok_or_else(|| eyre!("no song loaded"))?;
        info!(
            "song at 0x{:06X}: {} tracks, voice group 0x{:06X}",
            song.header,
            song.num_tracks(),
            song.voice_group
        );

        let scheduler = Scheduler::spawn(player).wrap_err("failed to start the tick thread")?;
        Ok(Self { scheduler, song })
    }

    /// Play to the end, logging player events.
    pub fn run_headless(mut self) -> EyreResult<()> {
        loop {
            while let Some(event) = self.scheduler.poll_event() {
                match event {
                    PlayerEvent::SongEnded => {
                        info!("song at 0x{:06X} finished", self.song.header);
                        self.scheduler.shutdown();
                        return Ok(());
                    }
                    PlayerEvent::LoadFailed(error) => {
                        return Err(error).wrap_err("tick thread could not load the song");
                    }
                    PlayerEvent::Fault(fault) => warn!("{}", fault),
                    other => info!("{:?}", other),
                }
            }
            if !self.scheduler.is_running() {
                return Err(eyre!("tick thread exited unexpectedly"));
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Run the terminal UI until the user quits.
    pub fn run_tui(self) -> EyreResult<()> {
        let mut terminal = ratatui::init();
        let mut ui = UiApp::new(self.scheduler, self.song);
        let result = ui.run(&mut terminal);
        ratatui::restore();
        result
    }
}
