//! The identity map: one per room, mapping durable client ids to the
//! connections currently speaking for them.
//!
//! # Invariants
//!
//! - Lookup is by `ClientId` only. A `ConnectionId` is never used to find
//!   a player, only to check that a request came from the connection the
//!   player is currently bound to.
//! - [`IdentityMap::rebind_player`] and [`IdentityMap::rebind_host`] are the
//!   only ways a binding's connection changes.
//! - A banned client has no binding and cannot get one back.
//!
//! Not thread-safe by itself: the owning room actor processes one command
//! at a time.

use std::collections::{HashMap, HashSet};

use bingo_protocol::{ClientId, ConnectionId};

use crate::{Binding, LinkState, Role, SessionError};

/// Client bindings for one room.
#[derive(Debug)]
pub struct IdentityMap {
    host: Binding,
    players: HashMap<ClientId, Binding>,
    banned: HashSet<ClientId>,
}

impl IdentityMap {
    /// Creates a map with the room's host bound to `connection`.
    pub fn new(host_id: ClientId, connection: ConnectionId) -> Self {
        Self {
            host: Binding::new(host_id, Role::Host, connection),
            players: HashMap::new(),
            banned: HashSet::new(),
        }
    }

    // -- Host --------------------------------------------------------------

    /// The host's binding.
    pub fn host(&self) -> &Binding {
        &self.host
    }

    /// Succeeds only if `connection` is the host's current, open connection.
    ///
    /// Checked at call time, so after a host reconnect the old connection
    /// loses its privileges immediately.
    pub fn require_host(&self, connection: ConnectionId) -> Result<(), SessionError> {
        if self.host.connection == connection && self.host.is_connected() {
            Ok(())
        } else {
            Err(SessionError::NotHost)
        }
    }

    /// Re-attaches the host identity to a new connection.
    ///
    /// Returns the connection the host was bound to before.
    pub fn rebind_host(
        &mut self,
        client_id: &ClientId,
        connection: ConnectionId,
    ) -> Result<ConnectionId, SessionError> {
        if *client_id != self.host.client_id {
            return Err(SessionError::UnknownClient(client_id.clone()));
        }
        let previous = self.host.connection;
        self.host.rebind(connection);
        tracing::info!(client = %client_id, %previous, %connection, "host rebound");
        Ok(previous)
    }

    // -- Players -----------------------------------------------------------

    /// Whether `client_id` is on the ban list.
    pub fn is_banned(&self, client_id: &ClientId) -> bool {
        self.banned.contains(client_id)
    }

    /// Whether `client_id` holds a player binding.
    pub fn is_player(&self, client_id: &ClientId) -> bool {
        self.players.contains_key(client_id)
    }

    /// Creates a binding for a brand-new player.
    ///
    /// # Errors
    /// - [`SessionError::Banned`] if the client was banned
    /// - [`SessionError::HostIdentity`] if the id belongs to the host
    /// - [`SessionError::AlreadyBound`] if the player already exists
    pub fn bind_player(
        &mut self,
        client_id: ClientId,
        connection: ConnectionId,
    ) -> Result<(), SessionError> {
        if self.banned.contains(&client_id) {
            return Err(SessionError::Banned(client_id));
        }
        if client_id == self.host.client_id {
            return Err(SessionError::HostIdentity(client_id));
        }
        if self.players.contains_key(&client_id) {
            return Err(SessionError::AlreadyBound(client_id));
        }
        tracing::debug!(client = %client_id, %connection, "player bound");
        self.players
            .insert(client_id.clone(), Binding::new(client_id, Role::Player, connection));
        Ok(())
    }

    /// Points an existing player at a new connection.
    ///
    /// Idempotent: rebinding to the connection it already has is a no-op
    /// apart from marking it connected. Returns the previous connection.
    pub fn rebind_player(
        &mut self,
        client_id: &ClientId,
        connection: ConnectionId,
    ) -> Result<ConnectionId, SessionError> {
        if self.banned.contains(client_id) {
            return Err(SessionError::Banned(client_id.clone()));
        }
        let binding = self
            .players
            .get_mut(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.clone()))?;
        let previous = binding.connection;
        binding.rebind(connection);
        tracing::debug!(client = %client_id, %previous, %connection, "player rebound");
        Ok(previous)
    }

    /// Removes a player and adds it to the ban list.
    ///
    /// Returns the removed binding so the caller can notify its connection.
    pub fn ban(&mut self, client_id: &ClientId) -> Result<Binding, SessionError> {
        if *client_id == self.host.client_id {
            return Err(SessionError::HostIdentity(client_id.clone()));
        }
        let binding = self
            .players
            .remove(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.clone()))?;
        self.banned.insert(client_id.clone());
        Ok(binding)
    }

    // -- Lookup ------------------------------------------------------------

    /// Confirms that `client_id` is bound to `connection` and returns its role.
    ///
    /// # Errors
    /// - [`SessionError::Banned`] for banned clients
    /// - [`SessionError::UnknownClient`] when there is no binding
    /// - [`SessionError::StaleConnection`] when another connection holds it
    pub fn verify(
        &self,
        client_id: &ClientId,
        connection: ConnectionId,
    ) -> Result<Role, SessionError> {
        let binding = if *client_id == self.host.client_id {
            &self.host
        } else if let Some(binding) = self.players.get(client_id) {
            binding
        } else if self.banned.contains(client_id) {
            return Err(SessionError::Banned(client_id.clone()));
        } else {
            return Err(SessionError::UnknownClient(client_id.clone()));
        };

        if binding.connection != connection {
            return Err(SessionError::StaleConnection {
                client_id: client_id.clone(),
                connection,
            });
        }
        Ok(binding.role)
    }

    /// A player's binding.
    pub fn player(&self, client_id: &ClientId) -> Option<&Binding> {
        self.players.get(client_id)
    }

    /// Marks every binding on `connection` as disconnected.
    ///
    /// Bindings that already moved to another connection are untouched.
    /// Returns the affected clients.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<ClientId> {
        let mut affected = Vec::new();
        let bindings = std::iter::once(&mut self.host).chain(self.players.values_mut());
        for binding in bindings {
            if binding.connection == connection && binding.is_connected() {
                binding.state = LinkState::Disconnected;
                affected.push(binding.client_id.clone());
            }
        }
        affected
    }

    /// Open connections of the host and every player, without duplicates.
    pub fn audience(&self) -> Vec<ConnectionId> {
        let mut out = Vec::with_capacity(self.players.len() + 1);
        let bindings = std::iter::once(&self.host).chain(self.players.values());
        for binding in bindings {
            if binding.is_connected() && !out.contains(&binding.connection) {
                out.push(binding.connection);
            }
        }
        out
    }

    /// Whether anyone in the room still has an open connection.
    pub fn any_connected(&self) -> bool {
        self.host.is_connected() || self.players.values().any(Binding::is_connected)
    }

    /// Number of player bindings.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of banned clients.
    pub fn banned_count(&self) -> usize {
        self.banned.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
