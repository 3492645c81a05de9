//! Error types for the transport layer.

/// Errors that can occur on the wire.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding or accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(std::io::Error),

    /// Sending a frame failed (the peer is probably gone).
    #[error("send failed: {0}")]
    SendFailed(std::io::Error),

    /// Receiving a frame failed mid-stream.
    #[error("receive failed: {0}")]
    ReceiveFailed(std::io::Error),
}
