//! Core protocol types for the coordinator's wire format.
//!
//! Everything in this module travels on the wire as JSON text frames.
//! The shapes are part of the contract with the browser client: field
//! names are camelCase, event and move tags are kebab-case strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable player identity, supplied by the caller.
///
/// In the shipped client this is the player's wallet address, but the
/// coordinator treats it as an opaque string. It survives reconnects —
/// a peer that drops and rejoins with the same `PeerId` resumes its
/// seat, ready flag, and game progress.
///
/// `#[serde(transparent)]` makes it serialize as the bare string, so it
/// can also act as a JSON object key (score maps, symbol maps).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Creates a new `PeerId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque room key, supplied by the caller on `join-room`.
///
/// Rooms are process-local; the coordinator never interprets the key
/// beyond using it to look up (or create) the room.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Creates a new `RoomId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one transport connection.
///
/// Unlike [`PeerId`], this changes every time the client reconnects.
/// The pairing of a stable peer with a replaceable connection is what
/// makes reconnection recovery work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game type
// ---------------------------------------------------------------------------

/// The three supported mini-games. Immutable once a room is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Tictactoe,
    Rps,
    Memory,
}

impl GameType {
    /// The wire name of this game type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tictactoe => "tictactoe",
            Self::Rps => "rps",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tictactoe" => Ok(Self::Tictactoe),
            "rps" => Ok(Self::Rps),
            "memory" => Ok(Self::Memory),
            other => Err(ProtocolError::UnknownGameType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal result
// ---------------------------------------------------------------------------

/// The outcome that ends a game instance: a winning peer, or a tie.
///
/// On the wire this is a plain string — the winner's peer id, or the
/// sentinel `"tie"`. That's the shape the client expects in
/// `game-end.winner`, so serialization is implemented by hand instead
/// of derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalResult {
    /// The named peer won.
    Winner(PeerId),
    /// Neither peer won.
    Tie,
}

/// Sentinel string used for ties in `game-end.winner`.
const TIE: &str = "tie";

impl Serialize for TerminalResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Winner(peer) => serializer.serialize_str(peer.as_str()),
            Self::Tie => serializer.serialize_str(TIE),
        }
    }
}

impl<'de> Deserialize<'de> for TerminalResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == TIE {
            Ok(Self::Tie)
        } else {
            Ok(Self::Winner(PeerId(s)))
        }
    }
}

impl fmt::Display for TerminalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner(peer) => write!(f, "{peer}"),
            Self::Tie => f.write_str(TIE),
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// A rock-paper-scissors choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

/// A game move, embedded in `submit-move`. The shape is game-type
/// specific and tagged by a `"type"` field:
///
/// ```json
/// { "type": "cell-click", "cellIndex": 4 }
/// { "type": "choice", "choice": "rock" }
/// { "type": "card-flip", "cardId": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Move {
    /// Tic-tac-toe: claim a board cell (0–8).
    #[serde(rename_all = "camelCase")]
    CellClick { cell_index: usize },

    /// Rock-paper-scissors: submit this round's choice.
    Choice { choice: Choice },

    /// Memory-match: flip one face-down card.
    #[serde(rename_all = "camelCase")]
    CardFlip { card_id: usize },
}

// ---------------------------------------------------------------------------
// Player snapshots
// ---------------------------------------------------------------------------

/// The client-visible view of one room member.
///
/// Connection ids stay server-internal; clients only need to know who
/// is seated and whether they've readied up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    /// The member's stable identity.
    pub peer_id: PeerId,
    /// Whether the member has signalled ready for the next game.
    pub ready: bool,
}

// ---------------------------------------------------------------------------
// Rejection reasons
// ---------------------------------------------------------------------------

/// Reason codes delivered with a `rejected` event.
///
/// Every recoverable error maps to one of these. Only the offending
/// client sees the rejection; other room members see no event at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// The room already seats two other peers.
    RoomFull,
    /// Acting on a room you are not a member of.
    UnknownPeer,
    /// Moving while it is the other player's turn.
    NotYourTurn,
    /// The rule engine refused the move (occupied cell, flipped card…).
    InvalidMove,
    /// The requested game type is not one of the supported three.
    UnknownGameType,
    /// Joining an existing room with a different game type.
    GameTypeMismatch,
    /// This connection is already bound to another room.
    AlreadyInRoom,
    /// The frame could not be decoded as a client event.
    BadEvent,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoomFull => "room-full",
            Self::UnknownPeer => "unknown-peer",
            Self::NotYourTurn => "not-your-turn",
            Self::InvalidMove => "invalid-move",
            Self::UnknownGameType => "unknown-game-type",
            Self::GameTypeMismatch => "game-type-mismatch",
            Self::AlreadyInRoom => "already-in-room",
            Self::BadEvent => "bad-event",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Events the client sends to the coordinator, tagged by `"event"`.
///
/// `gameType` in `join-room` is carried as a raw string and parsed by
/// the gateway, so an unsupported type produces an `unknown-game-type`
/// rejection instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join (or create) a room for the given game.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: RoomId,
        peer_id: PeerId,
        game_type: String,
    },

    /// Signal readiness for the next game.
    #[serde(rename_all = "camelCase")]
    PlayerReady { room_id: RoomId, peer_id: PeerId },

    /// Submit a move in the running game.
    #[serde(rename_all = "camelCase")]
    SubmitMove {
        room_id: RoomId,
        peer_id: PeerId,
        #[serde(rename = "move")]
        mv: Move,
    },

    /// Leave the room deliberately (no disconnect grace).
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: RoomId, peer_id: PeerId },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Events the coordinator sends to clients, tagged by `"event"`.
///
/// Game state payloads are opaque to this layer — they are owned by the
/// rule engines and carried here as raw JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A peer joined (or rejoined) the room. `gameState` is `null`
    /// unless a game is already running, in which case a reconnecting
    /// client uses it to restore its view.
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        players: Vec<PlayerInfo>,
        game_state: Option<Value>,
    },

    /// A member changed its ready flag.
    #[serde(rename_all = "camelCase")]
    PlayerReadyUpdate {
        players: Vec<PlayerInfo>,
        all_ready: bool,
    },

    /// Both players readied up; the game has started.
    #[serde(rename_all = "camelCase")]
    GameStart {
        game_state: Value,
        current_turn: Option<PeerId>,
    },

    /// A move (or a scheduled flip-back) was applied.
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        game_state: Value,
        current_turn: Option<PeerId>,
    },

    /// The game reached a terminal result.
    #[serde(rename_all = "camelCase")]
    GameEnd {
        winner: TerminalResult,
        final_state: Value,
    },

    /// A member left, or its disconnect grace expired.
    #[serde(rename_all = "camelCase")]
    PlayerDisconnected {
        peer_id: PeerId,
        players: Vec<PlayerInfo>,
    },

    /// The sender's last action was refused. Unicast to the offender
    /// only.
    #[serde(rename_all = "camelCase")]
    Rejected {
        reason: RejectReason,
        detail: String,
    },
}

// =========================================================================
// Tests
// =========================================================================
