use game_core::RoomSnapshot;
use game_types::{
    ClientMessage, GameError, GuessResult, PlayerId, RoomCode, RoomView, ServerMessage,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::room_actor::{Joined, RoomHandle, SnapshotReceiver};
use crate::room_registry::RoomRegistry;

/// The room a session currently belongs to.
struct Membership {
    player_id: PlayerId,
    room: RoomHandle,
    updates: SnapshotReceiver,
    latest: Arc<RoomSnapshot>,
}

impl Membership {
    fn new(room: RoomHandle, joined: Joined) -> Self {
        Self {
            player_id: joined.player.id,
            room,
            updates: joined.updates,
            latest: joined.snapshot,
        }
    }

    /// Keeps `snapshot` only if it is newer than what we hold.
    fn accept(&mut self, snapshot: Arc<RoomSnapshot>) -> bool {
        if snapshot.last_updated() > self.latest.last_updated() {
            self.latest = snapshot;
            true
        } else {
            false
        }
    }

    fn view(&self) -> Result<RoomView, GameError> {
        self.latest
            .view_for(self.player_id)
            .ok_or(GameError::PlayerNotFound {
                player_id: self.player_id,
            })
    }
}

/// One player's connection to the game: which room they are in and the
/// newest room state they have seen. Transports feed `ClientMessage`s in
/// through `handle_message` and forward what comes back.
pub struct GameSession {
    registry: Arc<RoomRegistry>,
    membership: Option<Membership>,
}

impl GameSession {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            membership: None,
        }
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.membership.as_ref().map(|m| m.player_id)
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.membership.as_ref().map(|m| m.room.code())
    }

    pub fn is_in_room(&self) -> bool {
        self.membership.is_some()
    }

    /// The room as this player last saw it.
    pub fn view(&self) -> Option<RoomView> {
        self.membership.as_ref().and_then(|m| m.view().ok())
    }

    pub async fn create_room(
        &mut self,
        player_name: &str,
        total_rounds: u32,
        time_per_round: u32,
    ) -> Result<RoomView, GameError> {
        self.ensure_not_in_room()?;
        let (room, joined) = self
            .registry
            .create_room(player_name, total_rounds, time_per_round)?;
        self.enter(room, joined)
    }

    pub async fn join_room(&mut self, code: &str, player_name: &str) -> Result<RoomView, GameError> {
        self.ensure_not_in_room()?;
        let (room, joined) = self.registry.join_room(code, player_name).await?;
        self.enter(room, joined)
    }

    pub async fn start_game(&mut self) -> Result<RoomView, GameError> {
        let (room, player_id) = self.member()?;
        room.start_game(player_id)
            .await
            .map_err(|e| self.forget_if_gone(e))?;
        self.refresh()
    }

    pub async fn select_word(&mut self, word: &str) -> Result<RoomView, GameError> {
        let (room, player_id) = self.member()?;
        room.select_word(player_id, word)
            .await
            .map_err(|e| self.forget_if_gone(e))?;
        self.refresh()
    }

    pub async fn submit_guess(&mut self, text: &str) -> Result<GuessResult, GameError> {
        let (room, player_id) = self.member()?;
        let result = room
            .submit_guess(player_id, text)
            .await
            .map_err(|e| self.forget_if_gone(e))?;
        self.refresh()?;
        Ok(result)
    }

    pub async fn advance_round(&mut self) -> Result<RoomView, GameError> {
        let (room, player_id) = self.member()?;
        room.advance_round(player_id)
            .await
            .map_err(|e| self.forget_if_gone(e))?;
        self.refresh()
    }

    pub async fn set_player_name(&mut self, name: &str) -> Result<RoomView, GameError> {
        let (room, player_id) = self.member()?;
        room.rename(player_id, name)
            .await
            .map_err(|e| self.forget_if_gone(e))?;
        self.refresh()
    }

    pub async fn word_options(&self) -> Result<Vec<String>, GameError> {
        let (room, player_id) = self.member()?;
        room.word_options(player_id).await
    }

    /// Leaves the current room. The session is out of the room afterwards
    /// even if the room had already gone away.
    pub async fn leave_room(&mut self) -> Result<(), GameError> {
        let membership = self.membership.take().ok_or(GameError::NotInRoom)?;
        match membership.room.leave(membership.player_id).await {
            Ok(_) | Err(GameError::RoomNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Applies every update already queued for this session, dropping any
    /// that are older than the state it holds. Returns the new view if
    /// anything changed.
    pub fn poll_update(&mut self) -> Option<RoomView> {
        let membership = self.membership.as_mut()?;
        let mut changed = false;
        loop {
            match membership.updates.try_recv() {
                Ok(snapshot) => changed |= membership.accept(snapshot),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("Session skipped {} room updates", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if changed { membership.view().ok() } else { None }
    }

    /// Waits for the next room update newer than the current view.
    /// Fails with `RoomNotFound` once the room has stopped.
    pub async fn next_update(&mut self) -> Result<RoomView, GameError> {
        let membership = self.membership.as_mut().ok_or(GameError::NotInRoom)?;
        loop {
            match membership.updates.recv().await {
                Ok(snapshot) => {
                    if membership.accept(snapshot) {
                        return membership.view();
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Session skipped {} room updates", skipped);
                }
                Err(RecvError::Closed) => {
                    let code = membership.room.code().clone();
                    self.membership = None;
                    return Err(GameError::room_not_found(code));
                }
            }
        }
    }

    /// Runs one client request and returns the messages to send back.
    pub async fn handle_message(&mut self, message: ClientMessage) -> Vec<ServerMessage> {
        let result = match message {
            ClientMessage::CreateRoom {
                player_name,
                total_rounds,
                time_per_round,
            } => self
                .create_room(&player_name, total_rounds, time_per_round)
                .await
                .map(Self::joined_messages),
            ClientMessage::JoinRoom { code, player_name } => self
                .join_room(&code, &player_name)
                .await
                .map(Self::joined_messages),
            ClientMessage::StartGame => self.start_game().await.map(Self::update_messages),
            ClientMessage::SelectWord { word } => self
                .select_word(&word)
                .await
                .map(|room| vec![ServerMessage::RoomUpdate { room }]),
            ClientMessage::SubmitGuess { text } => match self.submit_guess(&text).await {
                Ok(result) => {
                    let mut messages = vec![ServerMessage::GuessResult { result }];
                    messages.extend(self.view().map(|room| ServerMessage::RoomUpdate { room }));
                    Ok(messages)
                }
                Err(e) => Err(e),
            },
            ClientMessage::AdvanceRound => self.advance_round().await.map(Self::update_messages),
            ClientMessage::LeaveRoom => self.leave_room().await.map(|_| vec![ServerMessage::RoomLeft]),
            ClientMessage::SetPlayerName { name } => self
                .set_player_name(&name)
                .await
                .map(|room| vec![ServerMessage::RoomUpdate { room }]),
        };

        result.unwrap_or_else(|error| {
            warn!("Request failed for player {:?}: {}", self.player_id(), error);
            vec![ServerMessage::Error { error }]
        })
    }

    /// Leaves the room, ignoring the outcome. Call when the transport drops.
    pub async fn handle_disconnect(&mut self) {
        if let Some(player_id) = self.player_id() {
            info!("Handling disconnect for player {}", player_id);
            if let Err(e) = self.leave_room().await {
                debug!("Disconnect cleanup for player {}: {}", player_id, e);
            }
        }
    }

    fn joined_messages(room: RoomView) -> Vec<ServerMessage> {
        vec![ServerMessage::RoomJoined {
            player_id: room.you,
            room,
        }]
    }

    // A new round hands the drawer their candidate words
    fn update_messages(room: RoomView) -> Vec<ServerMessage> {
        let words = room.word_options.clone();
        let mut messages = vec![ServerMessage::RoomUpdate { room }];
        if let Some(words) = words {
            messages.push(ServerMessage::WordOptions { words });
        }
        messages
    }

    fn enter(&mut self, room: RoomHandle, joined: Joined) -> Result<RoomView, GameError> {
        let membership = Membership::new(room, joined);
        let view = membership.view()?;
        self.membership = Some(membership);
        Ok(view)
    }

    // A room that stopped under us (idle sweep, shutdown) ends the membership
    fn forget_if_gone(&mut self, error: GameError) -> GameError {
        if matches!(error, GameError::RoomNotFound { .. }) {
            self.membership = None;
        }
        error
    }

    fn ensure_not_in_room(&self) -> Result<(), GameError> {
        match self.room_code() {
            Some(code) => Err(GameError::invalid_input(&format!(
                "already in room {code}; leave it first"
            ))),
            None => Ok(()),
        }
    }

    fn member(&self) -> Result<(RoomHandle, PlayerId), GameError> {
        self.membership
            .as_ref()
            .map(|m| (m.room.clone(), m.player_id))
            .ok_or(GameError::NotInRoom)
    }

    // The actor publishes before it replies, so the update for a command we
    // just awaited is already queued.
    fn refresh(&mut self) -> Result<RoomView, GameError> {
        self.poll_update();
        self.membership
            .as_ref()
            .ok_or(GameError::NotInRoom)?
            .view()
    }
}
