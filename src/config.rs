//! Player settings that are not part of the song data.

/// Tempo a song starts at until its first TEMPO command.
pub const DEFAULT_TEMPO: u16 = 150;

/// Highest tempo the driver accepts (TEMPO 255 doubled).
pub const MAX_TEMPO: u16 = 510;

/// Commands a single track may execute within one tick before it is stopped.
pub const DEFAULT_WATCHDOG_LIMIT: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    pub default_tempo: u16,
    pub watchdog_limit: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_tempo: DEFAULT_TEMPO,
            watchdog_limit: DEFAULT_WATCHDOG_LIMIT,
        }
    }
}

impl PlayerConfig {
    pub fn with_tempo(mut self, tempo: u16) -> Self {
        self.default_tempo = clamp_tempo(tempo);
        self
    }

    pub fn with_watchdog_limit(mut self, limit: u32) -> Self {
        self.watchdog_limit = limit.max(1);
        self
    }
}

/// Clamp a tempo to `1..=510`.
pub fn clamp_tempo(tempo: u16) -> u16 {
    tempo.clamp(1, MAX_TEMPO)
}
