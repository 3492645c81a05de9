//! Wire protocol for the Parlor session coordinator.
//!
//! This crate defines the "language" that the browser client and the
//! coordinator speak:
//!
//! - **Identity types** ([`PeerId`], [`RoomId`], [`ConnectionId`],
//!   [`GameType`]) — who is playing what, where.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the messages that
//!   travel over the socket, tagged by an `"event"` field.
//! - **Moves** ([`Move`], [`Choice`]) — the game-type-specific move
//!   payloads embedded in `submit-move`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! registry (game semantics). It doesn't know about connections or
//! rooms — it only knows how messages look on the wire.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Choice, ClientEvent, ConnectionId, GameType, Move, PeerId, PlayerInfo,
    RejectReason, RoomId, ServerEvent, TerminalResult,
};
