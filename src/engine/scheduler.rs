//! Runs a [`Player`] on its own thread at the tempo-derived tick rate.
//!
//! Transport requests arrive through a lock-free command queue and are only
//! applied between ticks. Events and snapshots flow back through two more
//! queues. A late tick is run as soon as possible; the schedule is not
//! caught up, so drift under load accumulates rather than bursting.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::clamp_tempo;
use crate::io::AudioBackend;
use crate::sequencing::SongError;

use super::player::{Player, PlayerState, TrackFault};
use super::snapshot::PlayerSnapshot;

const COMMAND_QUEUE_SIZE: usize = 64;
const EVENT_QUEUE_SIZE: usize = 256;
const SNAPSHOT_QUEUE_SIZE: usize = 4;

/// Microseconds per tick at tempo 1.
const TICK_SCALE_US: u64 = 2_500_000;

/// Time between ticks at `tempo` (clamped to 1..=510).
pub fn tick_interval(tempo: u16) -> Duration {
    Duration::from_micros(TICK_SCALE_US / u64::from(clamp_tempo(tempo)))
}

/// Requests from a controlling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    TogglePause,
    Stop,
    Restart,
    /// Load and start the song whose header is at this image offset.
    LoadSong(u32),
    Shutdown,
}

/// Notifications from the tick thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    SongLoaded(u32),
    LoadFailed(SongError),
    StateChanged(PlayerState),
    Fault(TrackFault),
    SongEnded,
}

/// Handle to a running tick thread.
pub struct Scheduler<B: AudioBackend> {
    commands: Producer<TransportCommand>,
    events: Consumer<PlayerEvent>,
    snapshots: Consumer<PlayerSnapshot>,
    thread: Option<JoinHandle<Player<B>>>,
}

impl<B> Scheduler<B>
where
    B: AudioBackend + Send + 'static,
    B::Handle: Send,
{
    /// Move `player` onto a new thread and start ticking.
    pub fn spawn(player: Player<B>) -> std::io::Result<Self> {
        let (commands_tx, commands_rx) = RingBuffer::new(COMMAND_QUEUE_SIZE);
        let (events_tx, events_rx) = RingBuffer::new(EVENT_QUEUE_SIZE);
        let (snapshots_tx, snapshots_rx) = RingBuffer::new(SNAPSHOT_QUEUE_SIZE);

        let thread = thread::Builder::new()
            .name("mp2k-tick".into())
            .spawn(move || run(player, commands_rx, events_tx, snapshots_tx))?;

        Ok(Self {
            commands: commands_tx,
            events: events_rx,
            snapshots: snapshots_rx,
            thread: Some(thread),
        })
    }

    /// Queue a transport command; `false` if the queue is full.
    pub fn send(&mut self, command: TransportCommand) -> bool {
        self.commands.push(command).is_ok()
    }

    pub fn poll_event(&mut self) -> Option<PlayerEvent> {
        self.events.pop().ok()
    }

    /// The most recent snapshot published since the last call.
    pub fn latest_snapshot(&mut self) -> Option<PlayerSnapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.snapshots.pop() {
            latest = Some(snapshot);
        }
        latest
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    /// Stop the tick thread and take the player back.
    pub fn shutdown(mut self) -> Option<Player<B>> {
        self.join()
    }

    fn join(&mut self) -> Option<Player<B>> {
        let thread = self.thread.take()?;
        while self.commands.push(TransportCommand::Shutdown).is_err() {
            if thread.is_finished() {
                break;
            }
            thread::yield_now();
        }
        match thread.join() {
            Ok(player) => Some(player),
            Err(_) => {
                warn!("tick thread panicked");
                None
            }
        }
    }
}

impl<B: AudioBackend> Drop for Scheduler<B> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.push(TransportCommand::Shutdown);
            let _ = thread.join();
        }
    }
}

fn run<B: AudioBackend>(
    mut player: Player<B>,
    mut commands: Consumer<TransportCommand>,
    mut events: Producer<PlayerEvent>,
    mut snapshots: Producer<PlayerSnapshot>,
) -> Player<B> {
    info!("tick thread started at tempo {}", player.tempo());
    let mut next = Instant::now();

    loop {
        let before = player.state();
        while let Ok(command) = commands.pop() {
            match command {
                TransportCommand::Shutdown => {
                    player.stop();
                    info!("tick thread stopped");
                    return player;
                }
                TransportCommand::Play => player.play(),
                TransportCommand::Pause => player.pause(),
                TransportCommand::TogglePause => player.toggle_pause(),
                TransportCommand::Stop => player.stop(),
                TransportCommand::Restart => player.restart(),
                TransportCommand::LoadSong(header) => {
                    let event = match player.load_song(header) {
                        Ok(()) => PlayerEvent::SongLoaded(header),
                        Err(error) => {
                            warn!("could not load song at 0x{:06X}: {}", header, error);
                            PlayerEvent::LoadFailed(error)
                        }
                    };
                    let _ = events.push(event);
                }
            }
        }

        let ticking = player.state() == PlayerState::Playing;
        if ticking {
            let report = player.tick();
            for fault in report.faults {
                let _ = events.push(PlayerEvent::Fault(fault));
            }
            if report.song_ended {
                let _ = events.push(PlayerEvent::SongEnded);
            }
        }

        if player.state() != before {
            let _ = events.push(PlayerEvent::StateChanged(player.state()));
        }
        if ticking || player.state() != before {
            let _ = snapshots.push(player.snapshot());
        }

        next += tick_interval(player.tempo());
        let now = Instant::now();
        match next.checked_duration_since(now) {
            Some(wait) => thread::sleep(wait),
            None => next = now,
        }
    }
}
