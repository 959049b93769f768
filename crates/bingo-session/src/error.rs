//! Error types for the session layer.

use bingo_protocol::{ClientId, ConnectionId};

/// Errors raised while authorizing a host or resolving who sent an event.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The room-creation credential did not match the configured secret.
    #[error("incorrect admin password")]
    Unauthorized,

    /// The request needs the host, and the sender's connection is not the
    /// one currently bound to the host identity.
    #[error("only the host can do that")]
    NotHost,

    /// The client was banned from this room.
    #[error("client {0} is banned")]
    Banned(ClientId),

    /// No binding exists for this client in the room.
    #[error("client {0} is not in this room")]
    UnknownClient(ClientId),

    /// The client exists, but this connection is not its current one.
    /// Happens when an old tab keeps sending after the client reconnected
    /// elsewhere.
    #[error("connection {connection} is no longer bound to client {client_id}")]
    StaleConnection {
        client_id: ClientId,
        connection: ConnectionId,
    },

    /// The host identity cannot also hold a player card.
    #[error("client {0} is the host")]
    HostIdentity(ClientId),

    /// A player binding for this client already exists.
    #[error("client {0} already has a binding")]
    AlreadyBound(ClientId),
}
