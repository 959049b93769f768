//! Room registry: creates rooms and finds them by code.

use std::collections::HashMap;

use bingo_protocol::{ClientId, ConnectionId, RoomCode, ServerEvent};
use bingo_session::Authenticator;

use crate::actor::spawn_room;
use crate::{ConnectionSender, Room, RoomConfig, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Every live room on the server, keyed by code.
///
/// Owned by the server state rather than global. Rooms that shut down on
/// their own (idle expiry) leave a closed handle behind until
/// [`RoomRegistry::prune_closed`] runs.
pub struct RoomRegistry<A: Authenticator> {
    auth: A,
    config: RoomConfig,
    rooms: HashMap<RoomCode, RoomHandle>,
}

impl<A: Authenticator> RoomRegistry<A> {
    /// Creates an empty registry. `config` is applied to every new room.
    pub fn new(auth: A, config: RoomConfig) -> Self {
        Self {
            auth,
            config: config.validated(),
            rooms: HashMap::new(),
        }
    }

    /// Checks the credential, then spawns a room hosted by `host`.
    ///
    /// `RoomCreated` is sent on `sender` before this returns. Codes are
    /// regenerated until one is free.
    pub async fn create_room(
        &mut self,
        credential: &str,
        host: ClientId,
        conn: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<RoomCode, RoomError> {
        self.auth.authorize(credential).await?;
        self.prune_closed();

        let code = loop {
            let candidate = RoomCode::generate(&mut rand::rng());
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(room = %candidate, "room code collision, retrying");
        };

        let room = Room::new(code.clone(), self.config.clone(), host.clone(), conn);
        let handle = spawn_room(room, conn, sender.clone(), DEFAULT_CHANNEL_SIZE);
        let _ = sender.send(ServerEvent::RoomCreated {
            room_code: code.clone(),
        });
        self.rooms.insert(code.clone(), handle);
        tracing::info!(room = %code, host = %host, %conn, "room created");
        Ok(code)
    }

    /// Looks up a live room.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        match self.rooms.get(code) {
            Some(handle) if !handle.is_closed() => Ok(handle.clone()),
            _ => Err(RoomError::RoomNotFound(code.clone())),
        }
    }

    /// Drops handles of rooms whose actors have stopped. Returns how many.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|code, handle| {
            let open = !handle.is_closed();
            if !open {
                tracing::info!(room = %code, "room removed");
            }
            open
        });
        before - self.rooms.len()
    }

    /// Shuts a room down and forgets it.
    ///
    /// Public API for embedders that close rooms on demand. The bundled
    /// server never calls it: its rooms end through idle expiry and
    /// [`RoomRegistry::prune_closed`].
    pub async fn destroy_room(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Number of tracked rooms, including closed ones not yet pruned.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}
