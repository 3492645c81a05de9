//! Unified error type for the Parlor coordinator.

use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown game type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not a member, invalid move).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::AcceptFailed(std::io::Error::other("boom"));
        let top: ParlorError = err.into();
        assert!(matches!(top, ParlorError::Transport(_)));
        assert!(top.to_string().contains("boom"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownGameType("chess".into());
        let top: ParlorError = err.into();
        assert!(matches!(top, ParlorError::Protocol(_)));
        assert!(top.to_string().contains("chess"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(parlor_protocol::RoomId::new("r1"));
        let top: ParlorError = err.into();
        assert!(matches!(top, ParlorError::Room(_)));
    }
}
