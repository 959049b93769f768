//! Identity types: who is talking and which room they mean.
//!
//! Two kinds of identity travel through the system and must never be
//! confused:
//!
//! - [`ClientId`] is *durable*. The browser generates it once, keeps it in
//!   local storage, and sends it with every event. It survives page
//!   reloads and network drops, so it is the key for every player record.
//! - [`ConnectionId`] is *volatile*. The transport assigns a fresh one to
//!   every socket. It is only a delivery address.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// A durable, client-chosen identity.
///
/// Deserializing goes through [`ClientId::parse`], so an event carrying an
/// empty or oversized id is rejected by the codec before it reaches a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Longest accepted id, in characters.
    pub const MAX_LEN: usize = 64;

    /// Validates and wraps a raw client id.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidClientId`] if the id is empty, longer than
    /// [`Self::MAX_LEN`] characters, or contains control characters.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::InvalidClientId("empty".into()));
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ProtocolError::InvalidClientId(format!(
                "longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ProtocolError::InvalidClientId(
                "contains control characters".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A short, human-typeable room code such as `K7QX2`.
///
/// Codes are normalized to upper case, so players can type them in any case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a code.
    pub const LEN: usize = 5;

    /// Characters a code is drawn from: upper case letters and digits
    /// without `I`, `O`, `0`, `1`. 32^5 ≈ 33 million codes.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Generates a random code. Collisions are possible; the registry
    /// retries on collision.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let code = (0..Self::LEN)
            .map(|_| {
                let idx = rng.random_range(0..Self::ALPHABET.len());
                Self::ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    /// Parses a code typed by a user.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidRoomCode`] on wrong length or characters.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != Self::LEN {
            return Err(ProtocolError::InvalidRoomCode(format!(
                "expected {} characters, got {}",
                Self::LEN,
                code.len()
            )));
        }
        if let Some(bad) = code.bytes().find(|b| !Self::ALPHABET.contains(b)) {
            return Err(ProtocolError::InvalidRoomCode(format!(
                "unexpected character {:?}",
                bad as char
            )));
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ConnectionId
// ---------------------------------------------------------------------------

/// Opaque handle for one live transport connection.
///
/// Replaced whenever a client reconnects. Never used as a player key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw counter value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying counter value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_client_id_trims_and_accepts() {
        let id = ClientId::parse("  abc-123 ").unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn test_client_id_rejects_empty_and_long() {
        assert!(ClientId::parse("   ").is_err());
        let long = "x".repeat(ClientId::MAX_LEN + 1);
        assert!(ClientId::parse(&long).is_err());
        assert!(ClientId::parse("a\u{0007}b").is_err());
    }

    #[test]
    fn test_client_id_deserialize_validates() {
        let ok: ClientId = serde_json::from_str("\"c1\"").unwrap();
        assert_eq!(ok.as_str(), "c1");
        assert!(serde_json::from_str::<ClientId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"c1\"");
    }

    #[test]
    fn test_room_code_parse_is_case_insensitive() {
        let code = RoomCode::parse("ab3xz").unwrap();
        assert_eq!(code.as_str(), "AB3XZ");
        assert_eq!(code, "AB3XZ".parse().unwrap());
    }

    #[test]
    fn test_room_code_rejects_bad_input() {
        assert!(RoomCode::parse("ABCD").is_err());
        assert!(RoomCode::parse("ABCDEF").is_err());
        assert!(RoomCode::parse("AB-DE").is_err());
    }

    #[test]
    fn test_room_code_generate_is_parseable() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(RoomCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_room_code_has_no_lookalikes() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let code = RoomCode::generate(&mut rng);
            assert!(!code.as_str().contains(['I', 'O', '0', '1']), "{code}");
        }
        assert!(RoomCode::parse("AB1CD").is_err());
        assert!(RoomCode::parse("abode").is_err());
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
        assert_eq!(ConnectionId::new(7).into_inner(), 7);
    }
}
