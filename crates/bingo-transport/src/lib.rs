//! Transport abstraction layer for bingo-hall.
//!
//! A connection is split into a [`FrameSender`] and a [`FrameReceiver`] so
//! outbound pushes (draws, chat, tallies) never wait on a pending read.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use bingo_protocol::ConnectionId;
pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    WebSocketConnection, WebSocketReceiver, WebSocketSender, WebSocketTransport,
};

use std::net::SocketAddr;

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, TransportError>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A freshly accepted connection, before it is split.
pub trait Connection: Send + 'static {
    /// Write half.
    type Sender: FrameSender;
    /// Read half.
    type Receiver: FrameReceiver;

    /// The connection's volatile id.
    fn id(&self) -> ConnectionId;

    /// Splits into independently owned halves.
    fn split(self) -> (Self::Sender, Self::Receiver);
}

/// Write half of a connection.
pub trait FrameSender: Send + 'static {
    /// Sends one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Sends a close frame.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of a connection.
pub trait FrameReceiver: Send + 'static {
    /// Receives the next data frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}
