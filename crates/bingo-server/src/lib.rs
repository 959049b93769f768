//! # bingo-hall
//!
//! Live multiplayer bingo over WebSockets.
//!
//! A host with the admin secret opens a room and gets a five-character
//! code. Players join with that code and a durable client id, receive a
//! card, and follow the draws, letter votes, and chat pushed by the room.
//! Closing a tab loses nothing: reconnecting with the same client id
//! restores the card, marks, and transcript.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingo_server::{BingoServer, ServerConfig, init_tracing};
//!
//! # async fn run() -> Result<(), bingo_server::BingoError> {
//! init_tracing();
//! let server = BingoServer::from_config(ServerConfig::from_env()?).await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod logging;
mod server;

pub use config::{ConfigError, DEFAULT_BIND_ADDR, ServerConfig};
pub use error::BingoError;
pub use logging::init_tracing;
pub use server::{BingoServer, BingoServerBuilder};
