//! # Parlor
//!
//! Server-authoritative session coordinator for two-player browser
//! mini-games (tic-tac-toe, rock-paper-scissors, memory-match).
//!
//! Clients connect over WebSocket, join a room by caller-supplied id,
//! ready up, and exchange moves; the coordinator validates every move
//! against the rule engines and broadcasts the resulting state. Rooms
//! are process-local, serialized per-room, and reaped when idle.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use parlor::Coordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), parlor::ParlorError> {
//!     let server = Coordinator::builder()
//!         .bind("0.0.0.0:3001")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ParlorError;
pub use server::{Coordinator, CoordinatorBuilder};

// The pieces embedders usually need alongside the server.
pub use parlor_protocol::{ClientEvent, GameType, Move, PeerId, RoomId, ServerEvent};
pub use parlor_room::{ReaperConfig, Registry, RoomConfig};
