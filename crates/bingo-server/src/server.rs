//! `BingoServer` builder and server loop.
//!
//! This is the entry point for running a bingo server. It ties together
//! all the layers: transport → protocol → session → room.

use std::sync::Arc;
use std::time::Duration;

use bingo_protocol::{Codec, JsonCodec};
use bingo_room::{RoomConfig, RoomRegistry};
use bingo_session::{Authenticator, SharedSecret};
use bingo_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{BingoError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry<A>>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a bingo server.
///
/// # Example
///
/// ```rust,no_run
/// use bingo_protocol::JsonCodec;
/// use bingo_server::BingoServer;
/// use bingo_session::SharedSecret;
///
/// # async fn run() -> Result<(), bingo_server::BingoError> {
/// let server = BingoServer::<SharedSecret, JsonCodec>::builder()
///     .bind("0.0.0.0:3000")
///     .build(SharedSecret::new("change-me"))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BingoServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    prune_interval: Duration,
}

impl BingoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            room_config: RoomConfig::default(),
            prune_interval: Duration::from_secs(60),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// How often closed rooms are dropped from the registry.
    pub fn prune_interval(mut self, every: Duration) -> Self {
        self.prune_interval = every;
        self
    }

    /// Binds the listener with the given host authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<BingoServer<A, JsonCodec>, BingoError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomRegistry::new(auth, self.room_config)),
            codec: JsonCodec,
        });

        Ok(BingoServer {
            transport,
            state,
            prune_interval: self.prune_interval,
        })
    }
}

impl Default for BingoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound bingo server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BingoServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
    prune_interval: Duration,
}

impl BingoServer<SharedSecret, JsonCodec> {
    /// Binds a server from environment configuration.
    pub async fn from_config(config: ServerConfig) -> Result<Self, BingoError> {
        BingoServerBuilder::new()
            .bind(&config.bind_addr)
            .room_config(config.room)
            .build(SharedSecret::new(config.admin_secret))
            .await
    }
}

impl<A, C> BingoServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> BingoServerBuilder {
        BingoServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Spawns a handler task per connection and periodically drops rooms
    /// whose actors have shut down.
    pub async fn run(mut self) -> Result<(), BingoError> {
        tracing::info!(addr = ?self.local_addr().ok(), "bingo server running");

        let state = Arc::clone(&self.state);
        let every = self.prune_interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut prune = tokio::time::interval(every);
            prune.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                prune.tick().await;
                let mut rooms = state.rooms.lock().await;
                let removed = rooms.prune_closed();
                if removed > 0 {
                    tracing::info!(removed, live = rooms.room_count(), "pruned closed rooms");
                }
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
