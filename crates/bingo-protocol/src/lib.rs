//! Wire protocol for bingo-hall.
//!
//! - **Identifiers** ([`ClientId`], [`RoomCode`], [`ConnectionId`]).
//! - **Board vocabulary** ([`Letter`], [`Card`], [`FREE_SPACE`]).
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) and their payloads.
//! - **Codec** ([`Codec`], [`JsonCodec`]) for frames ↔ events.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Room (rules)
//! ```

mod card;
mod codec;
mod error;
mod events;
mod ids;

pub use card::{CARD_SIZE, COLUMN_SPAN, Card, FREE_SPACE, Letter, MAX_NUMBER};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ChatMessage, ClientEvent, LeaderboardEntry, ServerEvent, VoteTally};
pub use ids::{ClientId, ConnectionId, RoomCode};
