//! Error types for the room layer.

use std::time::Duration;

use bingo_protocol::{RoomCode, ServerEvent};
use bingo_session::SessionError;

/// Why a room rejected a request.
///
/// Every variant is recovered inside the room: the request is dropped and
/// the requester gets [`RoomError::notice`], if anything.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Bad admin credential, or a host-only action from a non-host.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown player, or a player action from a stale connection.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request does not fit the room's current state.
    #[error("{0}")]
    InvalidState(String),

    /// Chat cooldown still running.
    #[error("slow down: wait {}s before chatting again", retry_in.as_secs().max(1))]
    RateLimited { retry_in: Duration },

    /// The client was banned from this room.
    #[error("you are banned from this room")]
    Banned,

    /// A bingo claim on a card with no complete line.
    #[error("no bingo yet")]
    InvalidClaim,

    /// A second vote from the same client in one vote.
    #[error("already voted")]
    AlreadyVoted,

    /// The game already has a winner.
    #[error("game over")]
    GameOver,

    /// No room with this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// What the requester is told about this rejection.
    ///
    /// `None` means the rejection is silent.
    pub fn notice(&self) -> Option<ServerEvent> {
        match self {
            Self::Banned => Some(ServerEvent::BannedNotice),
            Self::AlreadyVoted => None,
            other => Some(ServerEvent::ErrorMessage {
                text: other.to_string(),
            }),
        }
    }
}

impl From<SessionError> for RoomError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthorized => Self::Unauthorized("incorrect admin password".into()),
            SessionError::NotHost => Self::Unauthorized("only the host can do that".into()),
            SessionError::Banned(_) => Self::Banned,
            SessionError::UnknownClient(id) => Self::NotFound(format!("no player {id} in this room")),
            SessionError::StaleConnection { client_id, .. } => {
                Self::NotFound(format!("{client_id} is connected elsewhere"))
            }
            SessionError::HostIdentity(_) => {
                Self::InvalidState("the host cannot do that as a player".into())
            }
            SessionError::AlreadyBound(id) => Self::InvalidState(format!("{id} already joined")),
        }
    }
}
