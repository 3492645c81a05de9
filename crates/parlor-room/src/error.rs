//! Error types for the room layer.

use parlor_games::MoveRejected;
use parlor_protocol::{GameType, PeerId, RejectReason, RoomId};

/// Errors that can occur during room operations.
///
/// All of these are recoverable at the gateway boundary: they become a
/// `rejected` event for the offending client and never disturb the rest
/// of the room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A third distinct peer tried to take a seat.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// A ready/move/leave from someone who isn't seated in the room.
    #[error("peer {peer} is not a member of room {room}")]
    UnknownPeer { room: RoomId, peer: PeerId },

    /// A move arrived out of turn.
    #[error("it is {0}'s turn")]
    NotYourTurn(PeerId),

    /// The rule engine refused the move.
    #[error(transparent)]
    InvalidMove(#[from] MoveRejected),

    /// The room exists but runs a different game.
    #[error("room {room} is a {expected} room, not {requested}")]
    GameTypeMismatch {
        room: RoomId,
        expected: GameType,
        requested: GameType,
    },

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's actor is gone or its channel is saturated.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The wire reason code delivered with the rejection event.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            Self::RoomFull(_) => RejectReason::RoomFull,
            Self::NotYourTurn(_) => RejectReason::NotYourTurn,
            Self::InvalidMove(_) => RejectReason::InvalidMove,
            Self::GameTypeMismatch { .. } => RejectReason::GameTypeMismatch,
            // Acting on a room you're not in and acting on a room that
            // no longer exists look the same from the client's side.
            Self::UnknownPeer { .. } | Self::NotFound(_) | Self::Unavailable(_) => {
                RejectReason::UnknownPeer
            }
        }
    }
}
