//! A binding is the identity half of a participant: which durable client
//! it is, what it is allowed to do, and which connection currently speaks
//! for it.

use bingo_protocol::{ClientId, ConnectionId};

/// What a bound client is allowed to do in its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Draws numbers, runs votes, bans.
    Host,
    /// Holds a card.
    Player,
}

/// Whether the bound connection is still open.
///
/// ```text
///   Connected ──(socket closed)──→ Disconnected
///       ↑                              │
///       └─────────(reconnect)──────────┘
/// ```
///
/// There is no expiry: a disconnected player keeps its card until the
/// room itself goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// One client's binding inside a room.
///
/// Equality and lookup use `client_id` only. `connection` is a delivery
/// address and is replaced on every reconnect.
#[derive(Debug, Clone)]
pub struct Binding {
    pub client_id: ClientId,
    pub role: Role,
    pub connection: ConnectionId,
    pub state: LinkState,
}

impl Binding {
    pub(crate) fn new(client_id: ClientId, role: Role, connection: ConnectionId) -> Self {
        Self {
            client_id,
            role,
            connection,
            state: LinkState::Connected,
        }
    }

    /// Whether the bound connection is open.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, LinkState::Connected)
    }

    /// Points the binding at a new connection and marks it connected.
    pub(crate) fn rebind(&mut self, connection: ConnectionId) {
        self.connection = connection;
        self.state = LinkState::Connected;
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.client_id == other.client_id
    }
}

impl Eq for Binding {}
