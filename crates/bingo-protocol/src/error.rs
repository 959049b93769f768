//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes or identifiers coming off the
//! wire were unusable. Game-rule rejections live in the room crate.

/// Errors that can occur while parsing identifiers or encoding/decoding
/// wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a server event failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The client sent malformed JSON, an unknown event type, or a
    /// field with the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A client id was empty, too long, or contained control characters.
    #[error("invalid client id: {0}")]
    InvalidClientId(String),

    /// A room code had the wrong length or characters outside `A-Z0-9`.
    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),

    /// A letter other than B, I, N, G, or O.
    #[error("invalid letter: {0}")]
    InvalidLetter(String),
}
