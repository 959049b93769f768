//! Room rules and lifecycle for bingo-hall.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns a
//! [`Room`]: the roster, draw history, vote, chat, and ban list of one game.
//!
//! # Key types
//!
//! - [`Room`]: the synchronous aggregate; every game rule lives here
//! - [`RoomRegistry`]: creates rooms and finds them by code
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: vote length, chat limits, idle expiry

mod actor;
mod card;
mod chat;
mod config;
mod draw;
mod error;
mod manager;
mod room;
mod vote;

pub use actor::{ConnectionSender, RoomHandle};
pub use card::{distance_to_win, generate_card};
pub use chat::ChatModerator;
pub use config::RoomConfig;
pub use draw::DrawPool;
pub use error::RoomError;
pub use manager::RoomRegistry;
pub use room::{Outbox, Recipient, Room, RoomInfo};
pub use vote::{VoteState, winning_letter};
