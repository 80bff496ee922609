use crate::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Six character join code players type or read out to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps user input, trimming whitespace and upper-casing it.
    /// Does not check the alphabet; see `RoomCodeGenerator::is_valid` in game-core.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomStatus {
    Waiting,  // Created, no round played yet
    Playing,  // Round in progress (word may not be chosen yet)
    RoundEnd, // Timer expired, waiting for the host to advance
    GameOver, // All rounds played
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Playing => "playing",
            RoomStatus::RoundEnd => "roundEnd",
            RoomStatus::GameOver => "gameOver",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_drawing: bool,
    pub is_room_creator: bool,
}

impl Player {
    pub fn new(name: impl Into<String>, is_room_creator: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            score: 0,
            is_drawing: false,
            is_room_creator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResult {
    pub player_id: PlayerId,
    pub player_name: String,
    pub guess: String,
    pub is_correct: bool,
    pub points_awarded: u32,
    /// Share of the guess's characters found in the word, only set for misses
    pub closeness: Option<u8>,
    pub timestamp: String, // ISO 8601 string
}

/// Authoritative room snapshot. Relations to players are by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub players: Vec<Player>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub time_per_round: u32,
    pub status: RoomStatus,
    pub current_word: Option<String>,
    pub current_drawer_id: Option<PlayerId>,
    pub guesses: Vec<GuessResult>,
    pub time_left: u32,
    /// Milliseconds; strictly increases with every mutation of this room
    pub last_updated: i64,
}

impl Room {
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn drawer(&self) -> Option<&Player> {
        self.current_drawer_id.and_then(|id| self.player(id))
    }

    pub fn creator(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_room_creator)
    }

    pub fn is_newer_than(&self, other: &Room) -> bool {
        self.last_updated > other.last_updated
    }

    /// Players ordered by score, highest first. Ties keep join order.
    pub fn standings(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.iter().collect();
        players.sort_by(|a, b| b.score.cmp(&a.score));
        players
    }
}

/// A room snapshot as one specific player is allowed to see it.
/// Guessers never receive the word; they get `word_hint` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomView {
    pub you: PlayerId,
    pub id: RoomId,
    pub code: RoomCode,
    pub players: Vec<Player>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub time_per_round: u32,
    pub status: RoomStatus,
    pub current_word: Option<String>,
    pub word_hint: Option<String>,
    /// Word of the round that just ended, revealed to everyone
    pub previous_word: Option<String>,
    pub word_options: Option<Vec<String>>,
    pub current_drawer_id: Option<PlayerId>,
    pub guesses: Vec<GuessResult>,
    pub time_left: u32,
    pub last_updated: i64,
}

impl RoomView {
    pub fn is_drawer(&self) -> bool {
        self.current_drawer_id == Some(self.you)
    }

    pub fn me(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.id == self.you)
    }
}
