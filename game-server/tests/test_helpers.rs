#![allow(dead_code)]

use game_core::WordBank;
use game_server::{Config, GameSession, RoomRegistry};
use game_types::{PlayerId, RoomCode, RoomView};
use std::sync::Arc;

/// Word list with known words for predictable testing
pub const TEST_WORDS: &str = "apple\nbanana\ndog\ncat\nhouse\ntrain\nguitar\nrocket";

/// Config with the built-in round timer turned off; tests drive the clock
pub fn manual_clock_config() -> Config {
    Config {
        tick_interval_ms: 0,
        ..Config::default()
    }
}

/// Test setup that provides a registry and sessions bound to it
pub struct TestServerSetup {
    pub registry: Arc<RoomRegistry>,
}

impl TestServerSetup {
    pub fn new() -> Self {
        Self::with_config(manual_clock_config())
    }

    pub fn with_config(config: Config) -> Self {
        let word_bank = Arc::new(WordBank::from_word_list(TEST_WORDS));
        Self {
            registry: Arc::new(RoomRegistry::new(&config, word_bank)),
        }
    }

    pub fn session(&self) -> GameSession {
        GameSession::new(self.registry.clone())
    }

    /// First name creates the room, the rest join in order
    pub async fn create_room_with_players(
        &self,
        names: &[&str],
        total_rounds: u32,
        time_per_round: u32,
    ) -> (RoomCode, Vec<GameSession>) {
        let mut creator = self.session();
        let view = creator
            .create_room(names[0], total_rounds, time_per_round)
            .await
            .expect("room creation");

        let mut sessions = vec![creator];
        for name in &names[1..] {
            let mut session = self.session();
            session
                .join_room(view.code.as_str(), name)
                .await
                .expect("join room");
            sessions.push(session);
        }
        sync_all(&mut sessions);
        (view.code, sessions)
    }

    /// Room with the game already started by its creator
    pub async fn create_started_game(
        &self,
        names: &[&str],
        total_rounds: u32,
    ) -> (RoomCode, Vec<GameSession>) {
        let (code, mut sessions) = self.create_room_with_players(names, total_rounds, 30).await;
        sessions[0].start_game().await.expect("start game");
        sync_all(&mut sessions);
        (code, sessions)
    }

    /// Sends `seconds` manual ticks and waits until the room applied them
    pub async fn tick(&self, code: &RoomCode, seconds: u32) {
        for _ in 0..seconds {
            self.registry.tick(code).await.expect("tick");
        }
        self.flush(code).await;
    }

    /// Round-trips a request so every queued command has been processed
    pub async fn flush(&self, code: &RoomCode) {
        let room = self.registry.get_room(code).expect("room exists");
        room.subscribe().await.expect("room answers");
    }
}

/// Pulls pending room updates into every session
pub fn sync_all(sessions: &mut [GameSession]) {
    for session in sessions.iter_mut() {
        session.poll_update();
    }
}

pub fn view_of(session: &GameSession) -> RoomView {
    session.view().expect("session should be in a room")
}

/// Index of the session whose player is drawing
pub fn drawer_index(sessions: &[GameSession]) -> usize {
    sessions
        .iter()
        .position(|s| s.view().is_some_and(|v| v.is_drawer()))
        .expect("a drawer should be assigned")
}

pub fn player_id(session: &GameSession) -> PlayerId {
    session.player_id().expect("session should be in a room")
}
