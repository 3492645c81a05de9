//! Room lifecycle management for Parlor.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! players, lifecycle state, and game payload. The [`Registry`] is the
//! single entry point: it creates rooms on first join, routes commands,
//! and sweeps out the idle ones.
//!
//! # Key types
//!
//! - [`Registry`] — the room table; create, join, ready, move, leave, sweep
//! - [`RoomHandle`] — send commands to one running room actor
//! - [`RoomState`] — lifecycle state machine
//! - [`RoomConfig`] — per-room timing knobs (flip-back delay, grace windows)
//! - [`ReaperConfig`] / [`spawn_reaper`] — the periodic idle-room sweep

mod config;
mod error;
mod reaper;
mod registry;
mod room;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use reaper::{ReaperConfig, spawn_reaper};
pub use registry::Registry;
pub use room::{EventSender, RoomHandle, RoomInfo};
