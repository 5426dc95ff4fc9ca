//! TUI for mp2k
//!
//! Draws the latest player snapshot and turns key presses into transport
//! commands for the tick thread.

mod tracks;
mod transport;

use std::collections::VecDeque;
use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};

use mp2k_player::engine::{PlayerEvent, Scheduler, TransportCommand};
use mp2k_player::sequencing::Song;
use mp2k_player::{NullBackend, PlayerSnapshot, PlayerState};

use tracks::render_tracks;
use transport::render_transport;

/// Event lines kept for the log panel
const EVENT_HISTORY: usize = 6;

pub struct UiApp {
    scheduler: Scheduler<NullBackend>,
    song: Song,
    /// Latest snapshot from the tick thread
    snapshot: PlayerSnapshot,
    events: VecDeque<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(scheduler: Scheduler<NullBackend>, song: Song) -> Self {
        let snapshot = PlayerSnapshot {
            state: PlayerState::Stopped,
            tempo: 0,
            ticks: 0,
            song: None,
            voices_playing: 0,
            tracks: Default::default(),
        };
        Self {
            scheduler,
            song,
            snapshot,
            events: VecDeque::with_capacity(EVENT_HISTORY),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_player();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn poll_player(&mut self) {
        if let Some(snapshot) = self.scheduler.latest_snapshot() {
            self.snapshot = snapshot;
        }
        while let Some(event) = self.scheduler.poll_event() {
            let line = match event {
                PlayerEvent::SongLoaded(header) => format!("loaded song at 0x{header:06X}"),
                PlayerEvent::LoadFailed(error) => format!("load failed: {error}"),
                PlayerEvent::StateChanged(state) => format!("{state:?}"),
                PlayerEvent::Fault(fault) => fault.to_string(),
                PlayerEvent::SongEnded => "song ended".to_string(),
            };
            if self.events.len() == EVENT_HISTORY {
                self.events.pop_front();
            }
            self.events.push_back(line);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let command = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char(' ') => TransportCommand::TogglePause,
            KeyCode::Char('s') => TransportCommand::Stop,
            KeyCode::Char('r') => TransportCommand::Restart,
            KeyCode::Char('p') => TransportCommand::Play,
            _ => return,
        };
        if !self.scheduler.send(command) {
            tracing::warn!("transport queue full, dropped {:?}", command);
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                        // Transport bar
                Constraint::Min(6),                           // Tracks
                Constraint::Length(EVENT_HISTORY as u16 + 2), // Events
                Constraint::Length(1),                        // Help bar
            ])
            .split(frame.area());

        render_transport(frame, chunks[0], &self.song, &self.snapshot);
        render_tracks(frame, chunks[1], &self.snapshot);

        let lines: Vec<Line> = self.events.iter().map(|e| Line::raw(e.as_str())).collect();
        let events = Paragraph::new(lines).block(Block::default().title(" Events ").borders(Borders::ALL));
        frame.render_widget(events, chunks[2]);

        let help = Paragraph::new(" [Q] Quit  [Space] Pause/Resume  [S] Stop  [R] Restart  [P] Play")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
