use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::{PlayerId, RoomStatus};

/// Every rejection the rules core can produce. All of them are recoverable and
/// meant to be shown to the player who triggered them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    #[error("Room {code} not found")]
    RoomNotFound { code: String },

    #[error("Cannot {action} while the room is {status}")]
    InvalidStateTransition { action: String, status: RoomStatus },

    #[error("Not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("You already guessed the word this round")]
    DuplicateGuess,

    #[error("Requested {requested} words but only {available} are available")]
    CapacityExceeded { requested: usize, available: usize },

    #[error("Player {player_id} is not in this room")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Room is full (max {capacity} players)")]
    RoomFull { capacity: usize },

    #[error("Invalid room settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Could not find a free room code after {attempts} attempts")]
    RoomCodeExhausted { attempts: u32 },

    #[error("You are not in a room")]
    NotInRoom,
}

impl GameError {
    pub fn invalid_transition(action: &str, status: RoomStatus) -> Self {
        GameError::InvalidStateTransition {
            action: action.to_string(),
            status,
        }
    }

    pub fn not_authorized(reason: &str) -> Self {
        GameError::NotAuthorized {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input(reason: &str) -> Self {
        GameError::InvalidInput {
            reason: reason.to_string(),
        }
    }

    pub fn room_not_found(code: impl ToString) -> Self {
        GameError::RoomNotFound {
            code: code.to_string(),
        }
    }
}
