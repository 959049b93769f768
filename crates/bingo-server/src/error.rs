//! Unified error type for the bingo server.

use bingo_protocol::ProtocolError;
use bingo_room::RoomError;
use bingo_session::SessionError;
use bingo_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BingoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed frame, bad identifier).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (bad credential, stale connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Bad or missing environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingo_protocol::RoomCode;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Receive("gone".into());
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Transport(_)));
        assert!(bingo_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRoomCode("bad".into());
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let bingo_err: BingoError = SessionError::Unauthorized.into();
        assert!(matches!(bingo_err, BingoError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::RoomNotFound(RoomCode::parse("ABCDE").unwrap());
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Room(_)));
        assert_eq!(bingo_err.to_string(), "room ABCDE not found");
    }

    #[test]
    fn test_from_config_error() {
        let bingo_err: BingoError = ConfigError::Missing("BINGO_ADMIN_SECRET").into();
        assert!(matches!(bingo_err, BingoError::Config(_)));
    }
}
