//! mp2k - terminal player for MP2K cartridge songs
//!
//! Run with: cargo run -- path/to/game.gba --table 0x1234 --index 3
//!       or: cargo run -- --demo

mod app;
mod demo;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{bail, Result as EyreResult, WrapErr};
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;

use mp2k_player::{PlayerConfig, Rom};

use app::{App, SongSelection};

#[derive(Parser)]
#[command(name = "mp2k")]
#[command(version, about = "Play MP2K songs from a cartridge image", long_about = None)]
struct Cli {
    /// Cartridge image to read songs from
    rom: Option<PathBuf>,

    /// Play the built-in demo song instead of a cartridge image
    #[arg(long, conflicts_with = "rom")]
    demo: bool,

    /// Image offset of a song header (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_offset, conflicts_with = "table")]
    song: Option<u32>,

    /// Image offset of the song table (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_offset)]
    table: Option<u32>,

    /// Song number within the song table
    #[arg(long, default_value_t = 0)]
    index: u32,

    /// Starting tempo before the song's first TEMPO command
    #[arg(long, default_value_t = mp2k_player::config::DEFAULT_TEMPO)]
    tempo: u16,

    /// Commands a track may run in one tick before it is stopped
    #[arg(long, default_value_t = mp2k_player::config::DEFAULT_WATCHDOG_LIMIT)]
    watchdog: u32,

    /// Play without the terminal UI, logging events to stderr
    #[arg(long)]
    headless: bool,

    /// Log file used while the terminal UI is up
    #[arg(long, default_value = "mp2k.log")]
    log: PathBuf,

    /// Log level
    #[arg(long, default_value_t = Level::INFO)]
    level: Level,
}

fn parse_offset(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| format!("invalid offset {text:?}: {err}"))
}

fn setup_logging(cli: &Cli) -> EyreResult<()> {
    if cli.headless {
        tracing_subscriber::fmt()
            .with_max_level(cli.level)
            .with_writer(std::io::stderr)
            .compact()
            .finish()
            .init();
    } else {
        // The terminal belongs to the UI; logs go to a file.
        let file = std::fs::File::create(&cli.log)
            .wrap_err_with(|| format!("failed to create log file {}", cli.log.display()))?;
        tracing_subscriber::fmt()
            .with_max_level(cli.level)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish()
            .init();
    }
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let (rom, selection) = if cli.demo {
        let (rom, header) = demo::build();
        (rom, SongSelection::Header(header))
    } else {
        let Some(path) = &cli.rom else {
            bail!("pass a cartridge image or --demo");
        };
        let bytes = std::fs::read(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let selection = match (cli.song, cli.table) {
            (Some(header), _) => SongSelection::Header(header),
            (None, Some(table)) => SongSelection::Table {
                table,
                index: cli.index,
            },
            (None, None) => bail!("pass --song <offset> or --table <offset>"),
        };
        (Rom::new(bytes), selection)
    };

    let config = PlayerConfig::default()
        .with_tempo(cli.tempo)
        .with_watchdog_limit(cli.watchdog);

    let app = App::new(rom, config, selection)?;
    if cli.headless {
        app.run_headless()
    } else {
        app.run_tui()
    }
}
