//! Client identity and host authorization for bingo-hall.
//!
//! 1. **Host authorization**: the [`Authenticator`] trait gates room
//!    creation; [`SharedSecret`] is the single-password implementation.
//! 2. **Identity bindings**: the [`IdentityMap`] ties each durable
//!    `ClientId` in a room to the connection currently speaking for it,
//!    and is the only place a connection handle is ever replaced.
//!
//! ```text
//! Room Layer (above)     ← asks "who sent this?" and "is this the host?"
//!     ↕
//! Session Layer (here)   ← ClientId ↔ ConnectionId bindings, ban list
//!     ↕
//! Protocol Layer (below) ← ClientId, ConnectionId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod binding;
mod error;
mod identity;

pub use auth::{Authenticator, SharedSecret};
pub use binding::{Binding, LinkState, Role};
pub use error::SessionError;
pub use identity::IdentityMap;
