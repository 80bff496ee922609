use game_core::{DEFAULT_MAX_PLAYERS, DEFAULT_OPTION_COUNT, RoomRules, WordBank};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read word list {path}: {source}")]
    WordList {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Round clock resolution. 0 disables the built-in timer so an external
    /// scheduler can drive `RoomRegistry::tick` instead.
    pub tick_interval_ms: u64,
    pub room_idle_timeout_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub max_players_per_room: usize,
    pub word_option_count: usize,
    pub end_round_when_all_guessed: bool,
    pub command_queue_capacity: usize,
    pub snapshot_channel_capacity: usize,
    pub word_list_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Self {
            tick_interval_ms: env_or("TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
            room_idle_timeout_seconds: env_or(
                "ROOM_IDLE_TIMEOUT_SECONDS",
                defaults.room_idle_timeout_seconds,
            )?,
            cleanup_interval_seconds: env_or(
                "CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            )?,
            max_players_per_room: env_or("MAX_PLAYERS_PER_ROOM", defaults.max_players_per_room)?,
            word_option_count: env_or("WORD_OPTION_COUNT", defaults.word_option_count)?,
            end_round_when_all_guessed: env_or(
                "END_ROUND_WHEN_ALL_GUESSED",
                defaults.end_round_when_all_guessed,
            )?,
            command_queue_capacity: env_or(
                "COMMAND_QUEUE_CAPACITY",
                defaults.command_queue_capacity,
            )?,
            snapshot_channel_capacity: env_or(
                "SNAPSHOT_CHANNEL_CAPACITY",
                defaults.snapshot_channel_capacity,
            )?,
            word_list_path: env::var("WORD_LIST_PATH").ok(),
        }
        .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let positive = [
            ("MAX_PLAYERS_PER_ROOM", self.max_players_per_room),
            ("COMMAND_QUEUE_CAPACITY", self.command_queue_capacity),
            ("SNAPSHOT_CHANNEL_CAPACITY", self.snapshot_channel_capacity),
            ("CLEANUP_INTERVAL_SECONDS", self.cleanup_interval_seconds as usize),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                });
            }
        }
        Ok(self)
    }

    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }

    pub fn room_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.room_idle_timeout_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }

    pub fn room_rules(&self) -> RoomRules {
        RoomRules {
            max_players: self.max_players_per_room,
            word_option_count: self.word_option_count,
            end_round_when_all_guessed: self.end_round_when_all_guessed,
        }
    }

    /// Word list from `WORD_LIST_PATH`, or the built-in corpus when unset.
    pub fn load_word_bank(&self) -> Result<WordBank, ConfigError> {
        match &self.word_list_path {
            Some(path) => WordBank::from_file(path).map_err(|source| ConfigError::WordList {
                path: path.clone(),
                source,
            }),
            None => Ok(WordBank::with_default_words()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            room_idle_timeout_seconds: 1800,
            cleanup_interval_seconds: 30,
            max_players_per_room: DEFAULT_MAX_PLAYERS,
            word_option_count: DEFAULT_OPTION_COUNT,
            end_round_when_all_guessed: false,
            command_queue_capacity: 64,
            snapshot_channel_capacity: 64,
            word_list_path: None,
        }
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
