//! Track table widget - one row per track with its live parameters and
//! the notes it currently has sounding

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use mp2k_player::engine::TrackSnapshot;
use mp2k_player::sequencing::ModType;
use mp2k_player::PlayerSnapshot;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Level meter width in cells
const METER_WIDTH: usize = 10;

fn note_name(note: u8) -> String {
    // 60 is C4
    let octave = i32::from(note / 12) - 1;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

fn meter(level: f32) -> String {
    let filled = (level.clamp(0.0, 1.0) * METER_WIDTH as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(METER_WIDTH - filled))
}

fn modulation(track: &TrackSnapshot) -> String {
    if track.mod_depth == 0 {
        return "-".to_string();
    }
    let kind = match track.mod_type {
        ModType::Vibrato => "vib",
        ModType::Tremolo => "trm",
        ModType::AutoPan => "pan",
    };
    format!("{kind} {}", track.mod_depth)
}

fn row(track: &TrackSnapshot) -> Row<'static> {
    let notes = track
        .notes
        .iter()
        .map(|n| note_name(n.note))
        .collect::<Vec<_>>()
        .join(" ");

    let style = if track.stopped {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(format!("{:2}", track.index)),
        Cell::from(format!("{:06X}", track.position)),
        Cell::from(format!("{:3}", track.voice)),
        Cell::from(format!("{:3}", track.volume)),
        Cell::from(format!("{:+3}", track.pan)),
        Cell::from(format!("{:+3}/{}", track.bend, track.bend_range)),
        Cell::from(modulation(track)),
        Cell::from(format!("{:2}", track.delay)),
        Cell::from(meter(track.peak_level())).style(Style::default().fg(Color::Green)),
        Cell::from(notes),
    ])
    .style(style)
}

pub fn render_tracks(frame: &mut Frame, area: Rect, snapshot: &PlayerSnapshot) {
    let header = Row::new(vec![
        "#", "Pos", "Voi", "Vol", "Pan", "Bend", "Mod", "Dly", "Level", "Notes",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let widths = [
        Constraint::Length(2),
        Constraint::Length(6),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(3),
        Constraint::Length(METER_WIDTH as u16),
        Constraint::Min(10),
    ];

    let table = Table::new(snapshot.tracks.iter().map(row), widths)
        .header(header)
        .block(Block::default().title(" Tracks ").borders(Borders::ALL));
    frame.render_widget(table, area);
}
