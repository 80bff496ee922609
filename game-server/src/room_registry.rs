use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use game_core::{RoomCodeGenerator, RoomRules, RoomSettings, RoomStateMachine, WordBank};
use game_types::{GameError, RoomCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::room_actor::{Joined, RoomActorConfig, RoomHandle, spawn_room};

// Lost races between picking a free code and claiming it
const MAX_CLAIM_ATTEMPTS: u32 = 4;

/// Directory of live rooms keyed by join code. Each entry addresses a task
/// that owns the room's state; the registry itself never touches game state.
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomCode, RoomHandle>>,
    word_bank: Arc<WordBank>,
    rules: RoomRules,
    actor_config: RoomActorConfig,
}

impl RoomRegistry {
    pub fn new(config: &Config, word_bank: Arc<WordBank>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            word_bank,
            rules: config.room_rules(),
            actor_config: RoomActorConfig {
                tick_interval: config.tick_interval(),
                command_queue_capacity: config.command_queue_capacity,
                snapshot_channel_capacity: config.snapshot_channel_capacity,
            },
        }
    }

    /// Registry with the built-in word list and default settings.
    pub fn with_default_words() -> Self {
        Self::new(&Config::default(), Arc::new(WordBank::with_default_words()))
    }

    /// Creates a room under a fresh code with `player_name` as its creator.
    /// Must be called from within a Tokio runtime.
    pub fn create_room(
        &self,
        player_name: &str,
        total_rounds: u32,
        time_per_round: u32,
    ) -> Result<(RoomHandle, Joined), GameError> {
        let settings = RoomSettings::new(total_rounds, time_per_round)?;
        let mut rng = rand::thread_rng();

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let code =
                RoomCodeGenerator::generate_unique(&mut rng, |code| self.rooms.contains_key(code))?;

            // Another creator may have claimed the same code in the meantime
            let Entry::Vacant(entry) = self.rooms.entry(code.clone()) else {
                debug!("Room code {} was claimed concurrently, retrying", code);
                continue;
            };

            let machine =
                RoomStateMachine::create(code, player_name, settings, self.word_bank.clone())?
                    .with_rules(self.rules.clone());
            let player = machine.room().players[0].clone();
            let (handle, snapshot, updates) =
                spawn_room(machine, &self.actor_config, self.rooms.clone());
            entry.insert(handle.clone());

            info!(
                "Created room {} for {} ({} rounds, {}s each)",
                handle.code(),
                player.name,
                total_rounds,
                time_per_round
            );
            return Ok((
                handle,
                Joined {
                    player,
                    snapshot,
                    updates,
                },
            ));
        }

        Err(GameError::RoomCodeExhausted {
            attempts: MAX_CLAIM_ATTEMPTS,
        })
    }

    /// Joins the room behind a user-typed code. Unknown or malformed codes
    /// are `RoomNotFound`.
    pub async fn join_room(
        &self,
        code: &str,
        player_name: &str,
    ) -> Result<(RoomHandle, Joined), GameError> {
        let handle = self.find(code)?;
        let joined = handle.join(player_name).await?;
        info!(
            "Player {} ({}) joined room {}",
            joined.player.name,
            joined.player.id,
            handle.code()
        );
        Ok((handle, joined))
    }

    pub fn find(&self, code: &str) -> Result<RoomHandle, GameError> {
        let code = RoomCode::new(code);
        if !RoomCodeGenerator::is_valid(&code) {
            return Err(GameError::room_not_found(&code));
        }
        self.get_room(&code)
            .ok_or_else(|| GameError::room_not_found(&code))
    }

    pub fn get_room(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Advances the clock of one room by a second, for hosts running with
    /// the built-in timer disabled.
    pub async fn tick(&self, code: &RoomCode) -> Result<(), GameError> {
        let handle = self
            .get_room(code)
            .ok_or_else(|| GameError::room_not_found(code))?;
        handle.tick().await
    }

    pub async fn tick_all(&self) {
        for handle in self.handles() {
            let _ = handle.tick().await;
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Stops rooms nobody has sent a command to within `timeout`.
    /// Returns how many were removed.
    pub async fn cleanup_idle_rooms(&self, timeout: Duration) -> usize {
        let expired: Vec<RoomHandle> = self
            .handles()
            .into_iter()
            .filter(|handle| handle.is_expired(timeout))
            .collect();

        for handle in &expired {
            self.rooms
                .remove_if(handle.code(), |_, current| current.id() == handle.id());
            handle.shutdown().await;
            info!("Removed abandoned room {}", handle.code());
        }
        expired.len()
    }

    pub async fn shutdown(&self) {
        let handles = self.handles();
        self.rooms.clear();
        for handle in &handles {
            handle.shutdown().await;
        }
        info!("Stopped {} rooms", handles.len());
    }

    // Snapshot of the handles so no map guard is held across an await
    fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.iter().map(|entry| entry.value().clone()).collect()
    }
}
