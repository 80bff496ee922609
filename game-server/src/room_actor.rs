use dashmap::DashMap;
use game_core::{LeaveOutcome, RoomSnapshot, RoomStateMachine, TickOutcome};
use game_types::{GameError, GuessResult, Player, PlayerId, Room, RoomCode, RoomId};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type Reply<T> = oneshot::Sender<Result<T, GameError>>;
pub type SnapshotReceiver = broadcast::Receiver<Arc<RoomSnapshot>>;

/// Everything a player needs after entering a room. The receiver is
/// subscribed before `snapshot` was taken, so no later update is missed.
#[derive(Debug)]
pub struct Joined {
    pub player: Player,
    pub snapshot: Arc<RoomSnapshot>,
    pub updates: SnapshotReceiver,
}

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_name: String,
        reply: Reply<Joined>,
    },
    StartGame {
        actor: PlayerId,
        reply: Reply<Room>,
    },
    SelectWord {
        actor: PlayerId,
        word: String,
        reply: Reply<Room>,
    },
    SubmitGuess {
        actor: PlayerId,
        text: String,
        reply: Reply<GuessResult>,
    },
    AdvanceRound {
        actor: PlayerId,
        reply: Reply<Room>,
    },
    Leave {
        actor: PlayerId,
        reply: Reply<LeaveOutcome>,
    },
    Rename {
        actor: PlayerId,
        name: String,
        reply: Reply<Room>,
    },
    WordOptions {
        actor: PlayerId,
        reply: Reply<Vec<String>>,
    },
    Subscribe {
        reply: oneshot::Sender<(Arc<RoomSnapshot>, SnapshotReceiver)>,
    },
    /// One second of round clock. `round` is set by the room's own timer so a
    /// tick queued before the round ended cannot leak into the next one.
    Tick { round: Option<u32> },
    Shutdown,
}

/// Cheap, cloneable address of a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    code: RoomCode,
    commands: mpsc::Sender<RoomCommand>,
    last_activity: Arc<Mutex<Instant>>,
}

impl RoomHandle {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        match self.last_activity.lock() {
            Ok(last_activity) => last_activity.elapsed() > timeout,
            Err(_) => true,
        }
    }

    pub async fn join(&self, player_name: &str) -> Result<Joined, GameError> {
        let player_name = player_name.to_string();
        self.request(|reply| RoomCommand::Join { player_name, reply })
            .await
    }

    pub async fn start_game(&self, actor: PlayerId) -> Result<Room, GameError> {
        self.request(|reply| RoomCommand::StartGame { actor, reply })
            .await
    }

    pub async fn select_word(&self, actor: PlayerId, word: &str) -> Result<Room, GameError> {
        let word = word.to_string();
        self.request(|reply| RoomCommand::SelectWord { actor, word, reply })
            .await
    }

    pub async fn submit_guess(&self, actor: PlayerId, text: &str) -> Result<GuessResult, GameError> {
        let text = text.to_string();
        self.request(|reply| RoomCommand::SubmitGuess { actor, text, reply })
            .await
    }

    pub async fn advance_round(&self, actor: PlayerId) -> Result<Room, GameError> {
        self.request(|reply| RoomCommand::AdvanceRound { actor, reply })
            .await
    }

    pub async fn leave(&self, actor: PlayerId) -> Result<LeaveOutcome, GameError> {
        self.request(|reply| RoomCommand::Leave { actor, reply })
            .await
    }

    pub async fn rename(&self, actor: PlayerId, name: &str) -> Result<Room, GameError> {
        let name = name.to_string();
        self.request(|reply| RoomCommand::Rename { actor, name, reply })
            .await
    }

    pub async fn word_options(&self, actor: PlayerId) -> Result<Vec<String>, GameError> {
        self.request(|reply| RoomCommand::WordOptions { actor, reply })
            .await
    }

    /// Latest snapshot plus a receiver for everything after it.
    pub async fn subscribe(&self) -> Result<(Arc<RoomSnapshot>, SnapshotReceiver), GameError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Subscribe { reply }).await?;
        response.await.map_err(|_| self.gone())
    }

    /// Manual clock tick, for hosts that drive time themselves.
    pub async fn tick(&self) -> Result<(), GameError> {
        self.send(RoomCommand::Tick { round: None }).await
    }

    pub(crate) async fn shutdown(&self) {
        let _ = self.commands.send(RoomCommand::Shutdown).await;
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, GameError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| self.gone())?
    }

    async fn send(&self, command: RoomCommand) -> Result<(), GameError> {
        self.commands.send(command).await.map_err(|_| self.gone())
    }

    fn gone(&self) -> GameError {
        GameError::room_not_found(&self.code)
    }
}

pub(crate) struct RoomActorConfig {
    pub tick_interval: Option<Duration>,
    pub command_queue_capacity: usize,
    pub snapshot_channel_capacity: usize,
}

/// Spawns the task that owns `machine` and returns its address together
/// with the creator's subscription.
pub(crate) fn spawn_room(
    machine: RoomStateMachine,
    config: &RoomActorConfig,
    registry: Arc<DashMap<RoomCode, RoomHandle>>,
) -> (RoomHandle, Arc<RoomSnapshot>, SnapshotReceiver) {
    let (commands, inbox) = mpsc::channel(config.command_queue_capacity);
    let (updates, creator_updates) = broadcast::channel(config.snapshot_channel_capacity);

    let handle = RoomHandle {
        id: machine.room().id,
        code: machine.code().clone(),
        commands: commands.clone(),
        last_activity: Arc::new(Mutex::new(Instant::now())),
    };
    let snapshot = Arc::new(machine.capture());

    let actor = RoomActor {
        machine,
        id: handle.id,
        code: handle.code.clone(),
        inbox,
        timer_commands: commands.downgrade(),
        updates,
        tick_interval: config.tick_interval,
        timer: None,
        registry,
        last_activity: handle.last_activity.clone(),
    };
    tokio::spawn(actor.run());

    (handle, snapshot, creator_updates)
}

/// Background task feeding `Tick` into one round. Aborted when dropped.
struct RoundTimer {
    round: u32,
    task: JoinHandle<()>,
}

impl RoundTimer {
    fn start(round: u32, interval: Duration, commands: mpsc::WeakSender<RoomCommand>) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let Some(commands) = commands.upgrade() else {
                    break;
                };
                let tick = RoomCommand::Tick { round: Some(round) };
                if commands.send(tick).await.is_err() {
                    break;
                }
            }
        });
        Self { round, task }
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct RoomActor {
    machine: RoomStateMachine,
    id: RoomId,
    code: RoomCode,
    inbox: mpsc::Receiver<RoomCommand>,
    timer_commands: mpsc::WeakSender<RoomCommand>,
    updates: broadcast::Sender<Arc<RoomSnapshot>>,
    tick_interval: Option<Duration>,
    timer: Option<RoundTimer>,
    registry: Arc<DashMap<RoomCode, RoomHandle>>,
    last_activity: Arc<Mutex<Instant>>,
}

impl RoomActor {
    async fn run(mut self) {
        debug!("Room {} task started", self.code);

        while let Some(command) = self.inbox.recv().await {
            if !matches!(command, RoomCommand::Tick { .. }) {
                self.update_activity();
            }
            if !self.handle(command) {
                break;
            }
            self.sync_timer();
        }

        self.timer = None;
        self.registry.remove_if(&self.code, |_, handle| handle.id == self.id);
        debug!("Room {} task stopped", self.code);
    }

    /// Applies one command. Returns false once the room should stop.
    fn handle(&mut self, command: RoomCommand) -> bool {
        match command {
            RoomCommand::Join { player_name, reply } => {
                let result = self.machine.join(&player_name).map(|player| {
                    let updates = self.updates.subscribe();
                    let snapshot = self.publish();
                    Joined {
                        player,
                        snapshot,
                        updates,
                    }
                });
                let _ = reply.send(result);
            }
            RoomCommand::StartGame { actor, reply } => {
                let result = self.machine.start_game(actor);
                self.respond(reply, result);
            }
            RoomCommand::SelectWord { actor, word, reply } => {
                let result = self.machine.select_word(actor, &word);
                self.respond(reply, result);
            }
            RoomCommand::SubmitGuess { actor, text, reply } => {
                let result = self.machine.submit_guess(actor, &text);
                self.respond(reply, result);
            }
            RoomCommand::AdvanceRound { actor, reply } => {
                let result = match self.machine.room().player(actor) {
                    Some(_) => self.machine.advance_round(),
                    None => Err(GameError::PlayerNotFound { player_id: actor }),
                };
                self.respond(reply, result);
            }
            RoomCommand::Rename { actor, name, reply } => {
                let result = self.machine.rename(actor, &name);
                self.respond(reply, result);
            }
            RoomCommand::WordOptions { actor, reply } => {
                let _ = reply.send(self.machine.word_options(actor));
            }
            RoomCommand::Leave { actor, reply } => match self.machine.leave(actor) {
                Ok(LeaveOutcome::Destroyed) => {
                    // Unregister before replying so the code is already gone
                    // when the last player's leave returns
                    self.registry
                        .remove_if(&self.code, |_, handle| handle.id == self.id);
                    info!("Removed empty room {}", self.code);
                    let _ = reply.send(Ok(LeaveOutcome::Destroyed));
                    return false;
                }
                result => self.respond(reply, result),
            },
            RoomCommand::Subscribe { reply } => {
                let updates = self.updates.subscribe();
                let _ = reply.send((Arc::new(self.machine.capture()), updates));
            }
            RoomCommand::Tick { round } => {
                if round.is_some_and(|round| round != self.machine.current_round()) {
                    debug!("Dropped stale tick for round {:?} in room {}", round, self.code);
                    return true;
                }
                match self.machine.tick() {
                    TickOutcome::Ignored => {}
                    TickOutcome::Running { .. } | TickOutcome::RoundEnded => {
                        self.publish();
                    }
                }
            }
            RoomCommand::Shutdown => {
                info!("Shutting down room {}", self.code);
                return false;
            }
        }
        true
    }

    fn respond<T>(&mut self, reply: Reply<T>, result: Result<T, GameError>) {
        match &result {
            Ok(_) => {
                self.publish();
            }
            Err(e) => debug!("Rejected command in room {}: {}", self.code, e),
        }
        let _ = reply.send(result);
    }

    fn publish(&self) -> Arc<RoomSnapshot> {
        let snapshot = Arc::new(self.machine.capture());
        // No receivers is fine; nobody is listening right now
        let _ = self.updates.send(snapshot.clone());
        snapshot
    }

    /// Keeps exactly one timer alive while the clock runs, owned by the current round.
    fn sync_timer(&mut self) {
        if !self.machine.is_clock_running() {
            if self.timer.take().is_some() {
                debug!("Stopped round timer in room {}", self.code);
            }
            return;
        }

        let Some(interval) = self.tick_interval else {
            return;
        };
        let round = self.machine.current_round();
        if self.timer.as_ref().map(|timer| timer.round) != Some(round) {
            debug!("Started round {} timer in room {}", round, self.code);
            self.timer = Some(RoundTimer::start(
                round,
                interval,
                self.timer_commands.clone(),
            ));
        }
    }

    fn update_activity(&self) {
        match self.last_activity.lock() {
            Ok(mut last_activity) => *last_activity = Instant::now(),
            Err(_) => warn!("Activity clock poisoned for room {}", self.code),
        }
    }
}
