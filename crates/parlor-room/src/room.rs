//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task and is driven purely by messages on
//! its command channel plus three internal deadlines (flip-back,
//! disconnect grace, empty-room). All mutations of a room happen on
//! this single task, so operations on one room are serialized while
//! distinct rooms proceed fully in parallel, and broadcasts always
//! observe the committed post-mutation state.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Duration, Instant};

use parlor_games::{self as games, GameState, MoveRejected};
use parlor_protocol::{
    ConnectionId, GameType, Move, PeerId, PlayerInfo, RoomId, ServerEvent,
    TerminalResult,
};

use crate::{RoomConfig, RoomError, RoomState};

/// A room seats at most two peers.
const MAX_PLAYERS: usize = 2;

/// Channel sender delivering server events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel. Variants with a
/// `oneshot::Sender` are request/response; the rest are fire-and-forget.
pub(crate) enum RoomCommand {
    /// Seat a peer, or re-bind a reconnecting one to its new transport.
    Join {
        peer_id: PeerId,
        connection_id: ConnectionId,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Mark a peer ready. Replies whether everyone is now ready.
    Ready {
        peer_id: PeerId,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },

    /// Validate and apply a game move.
    Move {
        peer_id: PeerId,
        mv: Move,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a peer deliberately (no disconnect grace).
    Leave {
        peer_id: PeerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// A transport dropped without an explicit leave. Starts the grace
    /// window; ignored when the peer already reconnected elsewhere.
    DropConnection {
        peer_id: PeerId,
        connection_id: ConnectionId,
    },

    /// Request a metadata snapshot.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut the room down.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub game_type: GameType,
    pub state: RoomState,
    pub player_count: usize,
    /// Time since the last accepted event; drives reaping.
    pub idle: Duration,
}

/// Handle to a running room actor. Cheap to clone — it wraps an
/// `mpsc::Sender`. The registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    game_type: GameType,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's key in the registry.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The game this room was created for.
    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    /// `true` when both handles point at the same actor. Used by the
    /// registry to avoid pruning a freshly respawned room under a
    /// stale key.
    pub(crate) fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    pub async fn join(
        &self,
        peer_id: PeerId,
        connection_id: ConnectionId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                peer_id,
                connection_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn set_ready(&self, peer_id: PeerId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Ready {
                peer_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn apply_move(&self, peer_id: PeerId, mv: Move) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Move {
                peer_id,
                mv,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn leave(&self, peer_id: PeerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                peer_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Fire-and-forget: the grace timer handles the rest.
    pub async fn drop_connection(
        &self,
        peer_id: PeerId,
        connection_id: ConnectionId,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::DropConnection {
                peer_id,
                connection_id,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// One seat in the room.
struct PlayerSlot {
    peer_id: PeerId,
    /// The current transport connection; replaced on reconnect.
    connection_id: ConnectionId,
    ready: bool,
    /// `false` while the peer sits inside the disconnect grace window.
    present: bool,
    grace_until: Option<Instant>,
    sender: EventSender,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    game_type: GameType,
    config: RoomConfig,
    state: RoomState,
    players: Vec<PlayerSlot>,
    game: Option<GameState>,
    current_turn: Option<PeerId>,
    created_at: Instant,
    last_activity: Instant,
    /// When a mismatched memory pair must flip back.
    flip_deadline: Option<Instant>,
    /// When an empty room gives up waiting for members.
    empty_deadline: Option<Instant>,
}

/// Sleeps until `deadline`, or pends forever when there is none — the
/// disarmed branches of the actor's `select!` loop.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl RoomActor {
    /// Runs the actor loop until shutdown or the empty-room deadline.
    async fn run(mut self, mut receiver: mpsc::Receiver<RoomCommand>) {
        tracing::info!(
            room_id = %self.room_id,
            game_type = %self.game_type,
            "room actor started"
        );

        loop {
            let flip = self.flip_deadline;
            let grace = self.next_grace_deadline();
            let empty = self.empty_deadline;

            tokio::select! {
                cmd = receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                },
                _ = until(flip) => self.resolve_flip_back(),
                _ = until(grace) => self.expire_grace(),
                _ = until(empty) => {
                    tracing::info!(
                        room_id = %self.room_id,
                        "empty-room grace elapsed, shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!(
            room_id = %self.room_id,
            lifetime = ?self.created_at.elapsed(),
            "room actor stopped"
        );
    }

    /// Dispatches one command. Returns `true` on shutdown.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                peer_id,
                connection_id,
                sender,
                reply,
            } => {
                let result = self.handle_join(peer_id, connection_id, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Ready { peer_id, reply } => {
                let result = self.handle_ready(peer_id);
                let _ = reply.send(result);
            }
            RoomCommand::Move { peer_id, mv, reply } => {
                let result = self.handle_move(peer_id, mv);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { peer_id, reply } => {
                let result = self.handle_leave(peer_id);
                let _ = reply.send(result);
            }
            RoomCommand::DropConnection {
                peer_id,
                connection_id,
            } => self.handle_drop(peer_id, connection_id),
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                return true;
            }
        }
        false
    }

    fn handle_join(
        &mut self,
        peer_id: PeerId,
        connection_id: ConnectionId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        if let Some(slot) = self.players.iter_mut().find(|s| s.peer_id == peer_id) {
            // Reconnection: same identity, new transport. The seat,
            // ready flag, and game progress all survive — only the
            // connection is replaced.
            slot.connection_id = connection_id;
            slot.sender = sender;
            slot.present = true;
            slot.grace_until = None;
            tracing::info!(
                room_id = %self.room_id,
                %peer_id,
                %connection_id,
                "peer reconnected"
            );
        } else {
            if self.players.len() >= MAX_PLAYERS {
                return Err(RoomError::RoomFull(self.room_id.clone()));
            }
            self.players.push(PlayerSlot {
                peer_id: peer_id.clone(),
                connection_id,
                ready: false,
                present: true,
                grace_until: None,
                sender,
            });
            self.empty_deadline = None;
            let next = if self.players.len() == MAX_PLAYERS {
                RoomState::WaitingForReady
            } else {
                RoomState::WaitingForPlayers
            };
            self.set_state(next);
            tracing::info!(
                room_id = %self.room_id,
                %peer_id,
                players = self.players.len(),
                "player joined"
            );
        }

        self.touch();
        // The snapshot includes the running game (if any) so a
        // reconnecting client can restore its view mid-match.
        self.broadcast(ServerEvent::PlayerJoined {
            players: self.roster(),
            game_state: self.game_value(),
        });
        Ok(())
    }

    fn handle_ready(&mut self, peer_id: PeerId) -> Result<bool, RoomError> {
        let Some(slot) = self.players.iter_mut().find(|s| s.peer_id == peer_id) else {
            return Err(self.unknown_peer(peer_id));
        };
        slot.ready = true;
        self.touch();

        let all_ready = self.state == RoomState::WaitingForReady
            && self.players.len() == MAX_PLAYERS
            && self.players.iter().all(|s| s.ready && s.present);

        self.broadcast(ServerEvent::PlayerReadyUpdate {
            players: self.roster(),
            all_ready,
        });

        if all_ready {
            self.start_game();
        }
        Ok(all_ready)
    }

    /// Both ready flags and the fresh game state become visible in one
    /// actor step, so clients can never observe a half-started game.
    fn start_game(&mut self) {
        let seats = [
            self.players[0].peer_id.clone(),
            self.players[1].peer_id.clone(),
        ];
        self.game = Some(games::initial_state(self.game_type, &seats));
        self.current_turn = games::initial_turn(self.game_type, &seats);
        self.set_state(RoomState::InProgress);
        tracing::info!(
            room_id = %self.room_id,
            game_type = %self.game_type,
            "game started"
        );

        self.broadcast(ServerEvent::GameStart {
            game_state: self.game_value().unwrap_or(Value::Null),
            current_turn: self.current_turn.clone(),
        });
    }

    fn handle_move(&mut self, peer_id: PeerId, mv: Move) -> Result<(), RoomError> {
        if !self.players.iter().any(|s| s.peer_id == peer_id) {
            return Err(self.unknown_peer(peer_id));
        }
        if self.state != RoomState::InProgress {
            return Err(RoomError::InvalidMove(MoveRejected::NoActiveGame));
        }
        if let Some(turn) = &self.current_turn {
            if *turn != peer_id {
                return Err(RoomError::NotYourTurn(turn.clone()));
            }
        }
        let Some(game) = self.game.as_mut() else {
            return Err(RoomError::InvalidMove(MoveRejected::NoActiveGame));
        };

        let outcome = games::apply_move(game, &peer_id, &mv)?;

        self.touch();
        self.current_turn = outcome.next_turn;
        if outcome.flip_back {
            self.flip_deadline = Some(Instant::now() + self.config.flip_back_delay);
        }

        match outcome.terminal {
            Some(result) => self.finish_game(result),
            None => self.broadcast_update(),
        }
        Ok(())
    }

    fn handle_leave(&mut self, peer_id: PeerId) -> Result<(), RoomError> {
        let Some(idx) = self.players.iter().position(|s| s.peer_id == peer_id) else {
            return Err(self.unknown_peer(peer_id));
        };
        self.touch();
        self.remove_peer(idx);
        Ok(())
    }

    fn handle_drop(&mut self, peer_id: PeerId, connection_id: ConnectionId) {
        let Some(slot) = self.players.iter_mut().find(|s| s.peer_id == peer_id) else {
            return;
        };
        if slot.connection_id != connection_id {
            // The peer already reconnected on a newer transport; this
            // drop belongs to the old one.
            return;
        }
        slot.present = false;
        slot.grace_until = Some(Instant::now() + self.config.disconnect_grace);
        self.touch();
        tracing::debug!(
            room_id = %self.room_id,
            %peer_id,
            grace = ?self.config.disconnect_grace,
            "connection dropped, grace window started"
        );
    }

    /// Removes the seat at `idx` and settles the consequences: the
    /// departure broadcast, opponent-forfeit when a game was running,
    /// and the empty-room countdown.
    fn remove_peer(&mut self, idx: usize) {
        let slot = self.players.remove(idx);
        tracing::info!(
            room_id = %self.room_id,
            peer_id = %slot.peer_id,
            players = self.players.len(),
            "player left"
        );

        self.broadcast(ServerEvent::PlayerDisconnected {
            peer_id: slot.peer_id,
            players: self.roster(),
        });

        if self.state == RoomState::InProgress {
            // Opponent forfeit: the remaining seat takes the win.
            let result = match self.players.first() {
                Some(winner) => TerminalResult::Winner(winner.peer_id.clone()),
                None => TerminalResult::Tie,
            };
            self.finish_game(result);
        } else {
            match self.players.len() {
                1 => self.set_state(RoomState::WaitingForPlayers),
                0 => self.drain_out(),
                _ => {}
            }
        }
    }

    /// Publishes the terminal result and resets for a rematch.
    fn finish_game(&mut self, result: TerminalResult) {
        self.set_state(RoomState::Finished);
        self.flip_deadline = None;
        tracing::info!(room_id = %self.room_id, winner = %result, "game ended");

        self.broadcast(ServerEvent::GameEnd {
            winner: result,
            final_state: self.game_value().unwrap_or(Value::Null),
        });

        // Rematch reset: seats survive, everyone must ready up again.
        self.game = None;
        self.current_turn = None;
        for slot in &mut self.players {
            slot.ready = false;
        }
        match self.players.len() {
            2 => self.set_state(RoomState::WaitingForReady),
            1 => self.set_state(RoomState::WaitingForPlayers),
            _ => self.drain_out(),
        }
    }

    /// The flip-back deadline fired: run the pure resolution and
    /// publish the result. A no-op when the match already ended.
    fn resolve_flip_back(&mut self) {
        self.flip_deadline = None;
        let resolution = match self.game.as_mut() {
            Some(game) => games::resolve_pending_flips(game),
            None => None,
        };
        let Some(resolution) = resolution else {
            return;
        };
        tracing::debug!(
            room_id = %self.room_id,
            next_turn = %resolution.next_turn,
            "flip-back resolved"
        );
        self.current_turn = Some(resolution.next_turn);
        match resolution.terminal {
            Some(result) => self.finish_game(result),
            None => self.broadcast_update(),
        }
    }

    /// Removes every peer whose grace window ran out.
    fn expire_grace(&mut self) {
        let now = Instant::now();
        while let Some(idx) = self
            .players
            .iter()
            .position(|s| s.grace_until.is_some_and(|at| at <= now))
        {
            let peer_id = self.players[idx].peer_id.clone();
            tracing::info!(
                room_id = %self.room_id,
                %peer_id,
                "disconnect grace elapsed, treating peer as gone"
            );
            self.remove_peer(idx);
        }
    }

    fn next_grace_deadline(&self) -> Option<Instant> {
        self.players.iter().filter_map(|s| s.grace_until).min()
    }

    /// Marks the room empty and arms its shutdown countdown.
    fn drain_out(&mut self) {
        self.set_state(RoomState::Empty);
        self.empty_deadline = Some(Instant::now() + self.config.empty_room_grace);
    }

    fn set_state(&mut self, next: RoomState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid room transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(
            room_id = %self.room_id,
            from = %self.state,
            to = %next,
            "room state transition"
        );
        self.state = next;
    }

    fn broadcast_update(&self) {
        self.broadcast(ServerEvent::GameUpdate {
            game_state: self.game_value().unwrap_or(Value::Null),
            current_turn: self.current_turn.clone(),
        });
    }

    /// Sends an event to every seat. Dead senders (dropped transports)
    /// are silently skipped.
    fn broadcast(&self, event: ServerEvent) {
        for slot in &self.players {
            let _ = slot.sender.send(event.clone());
        }
    }

    fn roster(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|s| PlayerInfo {
                peer_id: s.peer_id.clone(),
                ready: s.ready,
            })
            .collect()
    }

    fn game_value(&self) -> Option<Value> {
        let game = self.game.as_ref()?;
        match serde_json::to_value(game) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(
                    room_id = %self.room_id,
                    %error,
                    "failed to serialize game state"
                );
                None
            }
        }
    }

    fn unknown_peer(&self, peer: PeerId) -> RoomError {
        RoomError::UnknownPeer {
            room: self.room_id.clone(),
            peer,
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            game_type: self.game_type,
            state: self.state,
            player_count: self.players.len(),
            idle: self.last_activity.elapsed(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// The room starts `Empty` with its shutdown countdown armed, so an
/// actor whose first join never arrives cleans itself up.
pub(crate) fn spawn_room(
    room_id: RoomId,
    game_type: GameType,
    config: RoomConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);
    let now = Instant::now();

    let actor = RoomActor {
        room_id: room_id.clone(),
        game_type,
        empty_deadline: Some(now + config.empty_room_grace),
        config,
        state: RoomState::Empty,
        players: Vec::new(),
        game: None,
        current_turn: None,
        created_at: now,
        last_activity: now,
        flip_deadline: None,
    };

    tokio::spawn(actor.run(rx));

    RoomHandle {
        room_id,
        game_type,
        sender: tx,
    }
}
