//! Transport layer for the Parlor coordinator.
//!
//! Provides the [`Transport`] and [`Connection`] traits over persistent
//! client connections, plus the WebSocket implementation the browser
//! client talks to. Frames are JSON text — the protocol crate decides
//! what's inside them.

#![allow(async_fn_in_trait)]

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WsConnection, WsListener};

use parlor_protocol::ConnectionId;

/// Accepts new incoming connections.
pub trait Transport: Send + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, TransportError>;

    /// The local address the transport is bound to.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// A single connection carrying text frames.
///
/// Send and receive sides are independently locked, so the gateway's
/// writer task can push events while the reader loop is parked on
/// [`recv`](Connection::recv).
pub trait Connection: Send + Sync + 'static {
    /// Sends one text frame to the remote peer.
    async fn send(&self, text: &str) -> Result<(), TransportError>;

    /// Receives the next text frame.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<String>, TransportError>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), TransportError>;

    /// The process-unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
