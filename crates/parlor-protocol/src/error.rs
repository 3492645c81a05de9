//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound event failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame could not be parsed as the expected event.
    ///
    /// Common causes: malformed JSON, a missing `event` tag, or fields
    /// of the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A `join-room` named a game type the coordinator doesn't run.
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
}
