//! Room registry: the table of active rooms and the only way in.
//!
//! The registry owns every room exclusively — the gateway and reaper
//! talk to rooms through its API, never to room internals. The table
//! lock is held only for lookup/insert; command round-trips to room
//! actors happen after it is released, so a slow room never blocks
//! operations on other rooms.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::Duration;

use parlor_protocol::{ConnectionId, GameType, Move, PeerId, RoomId};

use crate::room::{EventSender, RoomHandle, RoomInfo, spawn_room};
use crate::{RoomConfig, RoomError};

/// The in-memory table of active rooms, keyed by caller-supplied id.
///
/// Constructor-scoped: tests run several independent registries side by
/// side, and nothing here is process-global.
pub struct Registry {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
    config: RoomConfig,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Seats `peer_id` in `room_id`, creating the room on first join.
    ///
    /// `game_type` must match an existing room's type. A returning peer
    /// (already seated) re-binds to `connection_id` and keeps its
    /// progress; a third distinct peer is refused with
    /// [`RoomError::RoomFull`].
    pub async fn join(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        game_type: GameType,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        for _attempt in 0..2 {
            let mismatch = {
                let rooms = self.rooms.lock().await;
                rooms
                    .get(room_id)
                    .filter(|handle| handle.game_type() != game_type)
                    .cloned()
            };
            if let Some(handle) = mismatch {
                // A dead actor's stale handle must not pin the old game
                // type; only a live room can refuse the join.
                if handle.info().await.is_ok() {
                    return Err(RoomError::GameTypeMismatch {
                        room: room_id.clone(),
                        expected: handle.game_type(),
                        requested: game_type,
                    });
                }
                self.prune(room_id, &handle).await;
            }

            let handle = {
                let mut rooms = self.rooms.lock().await;
                match rooms.get(room_id) {
                    Some(handle) if handle.game_type() != game_type => {
                        // Re-created under our feet with another type.
                        return Err(RoomError::GameTypeMismatch {
                            room: room_id.clone(),
                            expected: handle.game_type(),
                            requested: game_type,
                        });
                    }
                    Some(handle) => handle.clone(),
                    None => {
                        let handle =
                            spawn_room(room_id.clone(), game_type, self.config.clone());
                        tracing::info!(%room_id, %game_type, "room created");
                        rooms.insert(room_id.clone(), handle.clone());
                        handle
                    }
                }
            };

            match handle
                .join(peer_id.clone(), connection_id, sender.clone())
                .await
            {
                Err(RoomError::Unavailable(_)) => {
                    // The actor shut down between lookup and join (its
                    // empty-room countdown raced us). Drop the dead
                    // handle and go around once more with a fresh room.
                    self.prune(room_id, &handle).await;
                }
                other => return other,
            }
        }
        Err(RoomError::Unavailable(room_id.clone()))
    }

    /// Marks `peer_id` ready. Returns whether the room is now all-ready
    /// (which also means the game just started).
    pub async fn set_ready(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
    ) -> Result<bool, RoomError> {
        self.lookup(room_id).await?.set_ready(peer_id.clone()).await
    }

    /// Validates and applies a move in `peer_id`'s room.
    pub async fn apply_move(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        mv: Move,
    ) -> Result<(), RoomError> {
        self.lookup(room_id).await?.apply_move(peer_id.clone(), mv).await
    }

    /// Removes `peer_id` from the room immediately (explicit leave).
    pub async fn leave(&self, room_id: &RoomId, peer_id: &PeerId) -> Result<(), RoomError> {
        self.lookup(room_id).await?.leave(peer_id.clone()).await
    }

    /// Reports a transport drop without an explicit leave. The room
    /// starts the disconnect grace window; if the peer doesn't return
    /// in time it is treated as having left.
    pub async fn drop_connection(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
    ) -> Result<(), RoomError> {
        self.lookup(room_id)
            .await?
            .drop_connection(peer_id.clone(), connection_id)
            .await
    }

    /// Metadata snapshot of one room.
    pub async fn info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        self.lookup(room_id).await?.info().await
    }

    /// Removes rooms idle beyond `ttl` and prunes handles whose actors
    /// are already gone. No broadcasts — the players left long ago.
    ///
    /// Returns the reaped room ids. Calling it again immediately
    /// removes nothing.
    pub async fn sweep(&self, ttl: Duration) -> Vec<RoomId> {
        let snapshot: Vec<(RoomId, RoomHandle)> = {
            let rooms = self.rooms.lock().await;
            rooms.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let mut reaped = Vec::new();
        for (room_id, handle) in snapshot {
            match handle.info().await {
                Ok(info) if info.idle >= ttl => {
                    let _ = handle.shutdown().await;
                    self.prune(&room_id, &handle).await;
                    tracing::info!(%room_id, idle = ?info.idle, "room reaped");
                    reaped.push(room_id);
                }
                Ok(_) => {}
                Err(_) => {
                    // Actor already stopped (empty-room shutdown);
                    // just drop the stale table entry.
                    self.prune(&room_id, &handle).await;
                }
            }
        }
        reaped
    }

    /// The number of rooms currently in the table.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// A snapshot of all room ids.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    async fn lookup(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Removes the table entry for `room_id`, but only while it still
    /// points at `dead` — a fresh room respawned under the same key
    /// must survive.
    async fn prune(&self, room_id: &RoomId, dead: &RoomHandle) {
        let mut rooms = self.rooms.lock().await;
        if let Some(current) = rooms.get(room_id) {
            if current.same_room(dead) {
                rooms.remove(room_id);
                tracing::debug!(%room_id, "room removed from registry");
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
