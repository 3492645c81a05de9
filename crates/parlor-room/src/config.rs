//! Room configuration and lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Timing and sizing knobs shared by every room of a registry.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a mismatched memory pair stays face-up before the room
    /// flips it back.
    pub flip_back_delay: Duration,

    /// How long a dropped connection may stay absent before the peer is
    /// treated as having left (opponent-forfeit applies mid-game).
    pub disconnect_grace: Duration,

    /// How long a room with no members survives before its actor shuts
    /// down.
    pub empty_room_grace: Duration,

    /// Command channel capacity per room actor. Senders wait when the
    /// channel fills up (bounded backpressure).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            flip_back_delay: Duration::from_millis(1500),
            disconnect_grace: Duration::from_secs(10),
            empty_room_grace: Duration::from_secs(30),
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Empty → WaitingForPlayers → WaitingForReady → InProgress → Finished
///            ↑                      ↑                            │
///            └──────────────────────┴────────────────────────────┘
///                    (leaves / rematch reset)
/// ```
///
/// - **Empty**: no members. Freshly spawned, or everyone left; the
///   actor shuts down once the empty-room grace elapses.
/// - **WaitingForPlayers**: one member seated, waiting for the second.
/// - **WaitingForReady**: both seats taken, not everyone has readied
///   up. Also the rematch state after a finished game.
/// - **InProgress**: a game is running; moves are accepted.
/// - **Finished**: a terminal result was just reached. Transient — the
///   room immediately resets toward the next game or drains out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Empty,
    WaitingForPlayers,
    WaitingForReady,
    InProgress,
    Finished,
}

impl RoomState {
    /// Returns `true` if a new (not reconnecting) peer may take a seat.
    pub fn accepts_new_player(&self) -> bool {
        matches!(self, Self::Empty | Self::WaitingForPlayers)
    }

    /// Returns `true` while a game is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoomState::*;
        matches!(
            (self, target),
            (Empty, WaitingForPlayers)
                | (WaitingForPlayers, WaitingForReady)
                | (WaitingForPlayers, Empty)
                | (WaitingForReady, InProgress)
                | (WaitingForReady, WaitingForPlayers)
                | (InProgress, Finished)
                | (Finished, WaitingForReady)
                | (Finished, WaitingForPlayers)
                | (Finished, Empty)
        )
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::WaitingForReady => write!(f, "WaitingForReady"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
