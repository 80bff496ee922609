use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameError, GuessResult, PlayerId, RoomView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    CreateRoom {
        player_name: String,
        total_rounds: u32,
        time_per_round: u32,
    },
    JoinRoom { code: String, player_name: String },
    StartGame,
    SelectWord { word: String },
    SubmitGuess { text: String },
    AdvanceRound,
    LeaveRoom,
    SetPlayerName { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    RoomJoined { player_id: PlayerId, room: RoomView },
    RoomUpdate { room: RoomView },
    WordOptions { words: Vec<String> },
    GuessResult { result: GuessResult },
    RoomLeft,
    Error { error: GameError },
}

impl From<GameError> for ServerMessage {
    fn from(error: GameError) -> Self {
        ServerMessage::Error { error }
    }
}
