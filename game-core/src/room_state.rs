use game_types::{GameError, GuessResult, Player, PlayerId, Room, RoomCode, RoomStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::hints::{HINT_REVEAL_RATIO, closeness, reveal_hint};
use crate::{DEFAULT_OPTION_COUNT, RoomSnapshot, ScoringPolicy, WordBank};

pub const MIN_TOTAL_ROUNDS: u32 = 1;
pub const MAX_TOTAL_ROUNDS: u32 = 10;
pub const MIN_TIME_PER_ROUND: u32 = 30;
pub const MAX_TIME_PER_ROUND: u32 = 120;
pub const DEFAULT_MAX_PLAYERS: usize = 12;
pub const MAX_NAME_LENGTH: usize = 24;

/// Per-room game length, chosen by the creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    pub total_rounds: u32,
    pub time_per_round: u32,
}

impl RoomSettings {
    pub fn new(total_rounds: u32, time_per_round: u32) -> Result<Self, GameError> {
        if !(MIN_TOTAL_ROUNDS..=MAX_TOTAL_ROUNDS).contains(&total_rounds) {
            return Err(GameError::InvalidSettings {
                reason: format!(
                    "rounds must be between {} and {}, got {}",
                    MIN_TOTAL_ROUNDS, MAX_TOTAL_ROUNDS, total_rounds
                ),
            });
        }
        if !(MIN_TIME_PER_ROUND..=MAX_TIME_PER_ROUND).contains(&time_per_round) {
            return Err(GameError::InvalidSettings {
                reason: format!(
                    "time per round must be between {} and {} seconds, got {}",
                    MIN_TIME_PER_ROUND, MAX_TIME_PER_ROUND, time_per_round
                ),
            });
        }
        Ok(Self {
            total_rounds,
            time_per_round,
        })
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            total_rounds: 3,
            time_per_round: 60,
        }
    }
}

/// Server-wide rules, identical for every room a process hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRules {
    pub max_players: usize,
    pub word_option_count: usize,
    pub end_round_when_all_guessed: bool,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            word_option_count: DEFAULT_OPTION_COUNT,
            end_round_when_all_guessed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    Left(Room),
    /// The last player left; the room no longer exists
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to count down (no word chosen, round already over, ...)
    Ignored,
    Running { time_left: u32 },
    RoundEnded,
}

/// Authoritative state of one room. Every mutation goes through `&mut self`,
/// so whoever owns the machine serializes commands for that room.
#[derive(Debug)]
pub struct RoomStateMachine {
    room: Room,
    rules: RoomRules,
    word_bank: Arc<WordBank>,
    rng: StdRng,
    word_options: Option<Vec<String>>,
    word_hint: Option<String>,
    previous_word: Option<String>,
    correct_guessers: HashSet<PlayerId>,
    // Rotation slot of a drawer who left; the player who followed them now sits there
    vacated_drawer_slot: Option<usize>,
}

impl RoomStateMachine {
    /// New room in `Waiting` with the requesting player as its creator.
    pub fn create(
        code: RoomCode,
        player_name: &str,
        settings: RoomSettings,
        word_bank: Arc<WordBank>,
    ) -> Result<Self, GameError> {
        let creator = Player::new(validate_name(player_name)?, true);

        let room = Room {
            id: Uuid::new_v4(),
            code,
            players: vec![creator],
            current_round: 0,
            total_rounds: settings.total_rounds,
            time_per_round: settings.time_per_round,
            status: RoomStatus::Waiting,
            current_word: None,
            current_drawer_id: None,
            guesses: Vec::new(),
            time_left: 0,
            last_updated: now_millis(),
        };

        info!(
            "Created room {} ({} rounds, {}s per round)",
            room.code, room.total_rounds, room.time_per_round
        );

        Ok(Self {
            room,
            rules: RoomRules::default(),
            word_bank,
            rng: StdRng::from_entropy(),
            word_options: None,
            word_hint: None,
            previous_word: None,
            correct_guessers: HashSet::new(),
            vacated_drawer_slot: None,
        })
    }

    pub fn with_rules(mut self, rules: RoomRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the entropy-seeded generator, mostly for reproducible tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn snapshot(&self) -> Room {
        self.room.clone()
    }

    pub fn capture(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: self.room.clone(),
            word_options: self.word_options.clone(),
            word_hint: self.word_hint.clone(),
            previous_word: self.previous_word.clone(),
            correct_guessers: self.correct_guessers.clone(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.room.code
    }

    pub fn status(&self) -> RoomStatus {
        self.room.status
    }

    pub fn current_round(&self) -> u32 {
        self.room.current_round
    }

    pub fn creator_id(&self) -> Option<PlayerId> {
        self.room.creator().map(|p| p.id)
    }

    /// Whoever may start the game: the creator, or the longest-standing
    /// player once the creator has left.
    pub fn host_id(&self) -> Option<PlayerId> {
        self.creator_id()
            .or_else(|| self.room.players.first().map(|p| p.id))
    }

    /// True while a chosen word is counting down.
    pub fn is_clock_running(&self) -> bool {
        self.room.status == RoomStatus::Playing
            && self.room.current_word.is_some()
            && self.room.time_left > 0
    }

    pub fn join(&mut self, player_name: &str) -> Result<Player, GameError> {
        if self.room.status != RoomStatus::Waiting {
            return Err(GameError::invalid_transition("join", self.room.status));
        }
        if self.room.players.len() >= self.rules.max_players {
            return Err(GameError::RoomFull {
                capacity: self.rules.max_players,
            });
        }

        let player = Player::new(validate_name(player_name)?, false);
        self.room.players.push(player.clone());
        self.touch();

        info!(
            "Player {} ({}) joined room {}",
            player.name, player.id, self.room.code
        );
        Ok(player)
    }

    pub fn start_game(&mut self, actor: PlayerId) -> Result<Room, GameError> {
        if self.room.status != RoomStatus::Waiting {
            return Err(GameError::invalid_transition(
                "start the game",
                self.room.status,
            ));
        }
        self.require_member(actor)?;
        if self.host_id() != Some(actor) {
            return Err(GameError::not_authorized(
                "only the room creator can start the game",
            ));
        }

        let first_drawer = self.rng.gen_range(0..self.room.players.len());
        self.begin_round(1, first_drawer);

        info!(
            "Room {} started with {} players",
            self.room.code,
            self.room.players.len()
        );
        Ok(self.snapshot())
    }

    pub fn select_word(&mut self, actor: PlayerId, word: &str) -> Result<Room, GameError> {
        if self.room.status != RoomStatus::Playing {
            return Err(GameError::invalid_transition(
                "choose a word",
                self.room.status,
            ));
        }
        self.require_member(actor)?;
        if self.room.current_drawer_id != Some(actor) {
            return Err(GameError::not_authorized(
                "only the drawer can choose the word",
            ));
        }
        if self.room.current_word.is_some() {
            return Err(GameError::invalid_transition(
                "choose a second word",
                self.room.status,
            ));
        }

        let word = word.trim();
        if word.is_empty() {
            return Err(GameError::invalid_input("word cannot be empty"));
        }

        self.room.current_word = Some(word.to_string());
        self.room.time_left = self.room.time_per_round;
        self.word_options = None;
        self.word_hint = Some(reveal_hint(word, HINT_REVEAL_RATIO, &mut self.rng));
        self.touch();

        debug!(
            "Drawer {} chose a {}-letter word in room {}",
            actor,
            word.chars().count(),
            self.room.code
        );
        Ok(self.snapshot())
    }

    pub fn submit_guess(&mut self, actor: PlayerId, text: &str) -> Result<GuessResult, GameError> {
        let word = match (&self.room.status, &self.room.current_word) {
            (RoomStatus::Playing, Some(word)) => word.clone(),
            _ => return Err(GameError::invalid_transition("guess", self.room.status)),
        };
        let player_name = self.require_member(actor)?.name.clone();
        if self.room.current_drawer_id == Some(actor) {
            return Err(GameError::not_authorized("the drawer cannot guess"));
        }
        if self.correct_guessers.contains(&actor) {
            return Err(GameError::DuplicateGuess);
        }

        let guess = text.trim();
        if guess.is_empty() {
            return Err(GameError::invalid_input("guess cannot be empty"));
        }

        let is_correct = guess.to_lowercase() == word.trim().to_lowercase();
        let points_awarded = if is_correct {
            ScoringPolicy::award(self.room.time_left)
        } else {
            0
        };

        let result = GuessResult {
            player_id: actor,
            player_name,
            guess: text.to_string(),
            is_correct,
            points_awarded,
            closeness: (!is_correct).then(|| closeness(guess, &word)),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if is_correct {
            if let Some(player) = self.room.players.iter_mut().find(|p| p.id == actor) {
                player.score += points_awarded;
            }
            self.correct_guessers.insert(actor);
            info!(
                "Player {} guessed the word in room {} for {} points",
                actor, self.room.code, points_awarded
            );
        }

        self.room.guesses.push(result.clone());
        self.touch();

        if is_correct && self.rules.end_round_when_all_guessed && self.everyone_guessed() {
            self.end_round("every player guessed the word");
        }

        Ok(result)
    }

    /// One second of the round clock. Safe to call repeatedly: anything that
    /// arrives after the round ended is ignored.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_clock_running() {
            return TickOutcome::Ignored;
        }

        self.room.time_left -= 1;
        self.touch();

        if self.room.time_left == 0 {
            self.end_round("time expired");
            TickOutcome::RoundEnded
        } else {
            TickOutcome::Running {
                time_left: self.room.time_left,
            }
        }
    }

    pub fn advance_round(&mut self) -> Result<Room, GameError> {
        if self.room.status != RoomStatus::RoundEnd {
            return Err(GameError::invalid_transition(
                "advance to the next round",
                self.room.status,
            ));
        }

        let next_round = self.room.current_round + 1;
        if next_round > self.room.total_rounds {
            self.room.status = RoomStatus::GameOver;
            self.room.current_round = self.room.total_rounds;
            self.room.current_drawer_id = None;
            self.room.current_word = None;
            self.room.time_left = 0;
            for player in &mut self.room.players {
                player.is_drawing = false;
            }
            self.touch();

            let final_scores: Vec<String> = self
                .room
                .standings()
                .iter()
                .map(|p| format!("{}: {}", p.name, p.score))
                .collect();
            info!(
                "Game over in room {}, final scores: {}",
                self.room.code,
                final_scores.join(", ")
            );
            return Ok(self.snapshot());
        }

        let next_drawer = self.next_drawer_index();
        self.begin_round(next_round, next_drawer);
        Ok(self.snapshot())
    }

    pub fn leave(&mut self, actor: PlayerId) -> Result<LeaveOutcome, GameError> {
        let index = self
            .room
            .players
            .iter()
            .position(|p| p.id == actor)
            .ok_or(GameError::PlayerNotFound { player_id: actor })?;

        let departed = self.room.players.remove(index);
        self.correct_guessers.remove(&actor);
        info!(
            "Player {} ({}) left room {}",
            departed.name, departed.id, self.room.code
        );

        if self.room.players.is_empty() {
            info!("Room {} is empty and has been destroyed", self.room.code);
            return Ok(LeaveOutcome::Destroyed);
        }

        if self.room.current_drawer_id == Some(actor) {
            self.room.current_drawer_id = None;
            self.vacated_drawer_slot = Some(index);
            if self.room.status == RoomStatus::Playing {
                self.end_round("the drawer left");
            }
        } else if let Some(slot) = self.vacated_drawer_slot {
            if index < slot {
                self.vacated_drawer_slot = Some(slot - 1);
            }
        }

        if self.room.status == RoomStatus::Playing
            && self.room.current_word.is_some()
            && self.rules.end_round_when_all_guessed
            && self.everyone_guessed()
        {
            self.end_round("every remaining player guessed the word");
        }

        self.touch();
        Ok(LeaveOutcome::Left(self.snapshot()))
    }

    pub fn rename(&mut self, actor: PlayerId, name: &str) -> Result<Room, GameError> {
        let name = validate_name(name)?;
        let player = self
            .room
            .players
            .iter_mut()
            .find(|p| p.id == actor)
            .ok_or(GameError::PlayerNotFound { player_id: actor })?;
        player.name = name;
        self.touch();
        Ok(self.snapshot())
    }

    /// Candidate words for the drawer, available until one is chosen.
    pub fn word_options(&self, actor: PlayerId) -> Result<Vec<String>, GameError> {
        self.require_member(actor)?;
        if self.room.status != RoomStatus::Playing || self.room.current_drawer_id != Some(actor) {
            return Err(GameError::not_authorized(
                "only the drawer can see the word options",
            ));
        }
        self.word_options
            .clone()
            .ok_or_else(|| GameError::invalid_transition("view word options", self.room.status))
    }

    fn begin_round(&mut self, round: u32, drawer_index: usize) {
        for (index, player) in self.room.players.iter_mut().enumerate() {
            player.is_drawing = index == drawer_index;
        }
        let drawer_id = self.room.players[drawer_index].id;

        self.room.current_round = round;
        self.room.status = RoomStatus::Playing;
        self.room.current_drawer_id = Some(drawer_id);
        self.room.current_word = None;
        self.room.guesses.clear();
        self.room.time_left = self.room.time_per_round;
        self.correct_guessers.clear();
        self.vacated_drawer_slot = None;
        self.word_hint = None;
        self.previous_word = None;

        // A small custom corpus still yields options, just fewer of them
        let count = self.rules.word_option_count.min(self.word_bank.len());
        self.word_options = self.word_bank.sample_options(count, &mut self.rng).ok();

        self.touch();
        info!(
            "Room {} round {}/{} started, drawer {}",
            self.room.code, round, self.room.total_rounds, drawer_id
        );
    }

    fn end_round(&mut self, reason: &str) {
        self.room.status = RoomStatus::RoundEnd;
        self.previous_word = self.room.current_word.take();
        self.room.time_left = 0;
        self.word_options = None;
        self.word_hint = None;
        for player in &mut self.room.players {
            player.is_drawing = false;
        }
        self.touch();

        info!(
            "Room {} round {} ended: {}",
            self.room.code, self.room.current_round, reason
        );
    }

    fn next_drawer_index(&self) -> usize {
        let player_count = self.room.players.len();
        if let Some(slot) = self.vacated_drawer_slot {
            return slot % player_count;
        }

        self.room
            .current_drawer_id
            .and_then(|id| self.room.players.iter().position(|p| p.id == id))
            .map(|index| (index + 1) % player_count)
            .unwrap_or(0)
    }

    fn everyone_guessed(&self) -> bool {
        let mut guessers = self
            .room
            .players
            .iter()
            .filter(|p| Some(p.id) != self.room.current_drawer_id)
            .peekable();
        guessers.peek().is_some() && guessers.all(|p| self.correct_guessers.contains(&p.id))
    }

    fn require_member(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.room
            .player(player_id)
            .ok_or(GameError::PlayerNotFound { player_id })
    }

    // Wall clock in ms, bumped by one when the clock has not moved forward
    fn touch(&mut self) {
        self.room.last_updated = now_millis().max(self.room.last_updated + 1);
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn validate_name(name: &str) -> Result<String, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::invalid_input("player name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(GameError::InvalidInput {
            reason: format!("player name must be at most {} characters", MAX_NAME_LENGTH),
        });
    }
    Ok(name.to_string())
}
