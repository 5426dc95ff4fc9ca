//! Transport bar widget - song, play state, tempo and position

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use mp2k_player::sequencing::Song;
use mp2k_player::synth::{DIRECT_SLOTS, GB_SLOTS};
use mp2k_player::{PlayerSnapshot, PlayerState};

pub fn render_transport(frame: &mut Frame, area: Rect, song: &Song, snapshot: &PlayerSnapshot) {
    let block = Block::default().title(" mp2k ").borders(Borders::ALL);

    let (symbol, label, color) = match snapshot.state {
        PlayerState::Playing => ("▶", "Playing", Color::Green),
        PlayerState::Paused => ("⏸", "Paused", Color::Yellow),
        PlayerState::Stopped => ("■", "Stopped", Color::Red),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Song 0x{:06X}  ", song.header),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!("Tempo: {}  ", snapshot.tempo),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Tick: {}  ", snapshot.ticks),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Voices: {}/{}", snapshot.voices_playing, DIRECT_SLOTS + GB_SLOTS),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
