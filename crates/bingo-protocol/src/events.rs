//! Events that travel on the wire.
//!
//! Both directions use internally tagged JSON, so every frame is a flat
//! object with a `type` field:
//!
//! ```text
//! → {"type":"JoinRoom","room_code":"K7QX2","name":"Ana","client_id":"c-19"}
//! ← {"type":"NumberDrawn","number":42,"history":[17,42]}
//! ```

use serde::{Deserialize, Serialize};

use crate::{Card, ClientId, Letter, RoomCode};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a browser can ask the server to do.
///
/// Host-only events (`StartGame`, `DrawNumber`, `StartVote`) carry no
/// client id: the host is recognized by the connection it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Open a new room. `credential` must match the server's admin secret.
    CreateRoom {
        credential: String,
        client_id: ClientId,
    },

    /// Close registration and begin play.
    StartGame { room_code: RoomCode },

    /// Draw the next number with no letter bias.
    DrawNumber { room_code: RoomCode },

    /// Open a timed vote on the next letter.
    StartVote { room_code: RoomCode },

    /// Cast a vote in the active letter vote.
    SubmitVote {
        room_code: RoomCode,
        letter: Letter,
        client_id: ClientId,
    },

    /// Join as a player, or resume if `client_id` already has a card.
    JoinRoom {
        room_code: RoomCode,
        name: String,
        client_id: ClientId,
    },

    /// Re-attach this connection to an existing host or player identity.
    Reconnect {
        room_code: RoomCode,
        client_id: ClientId,
    },

    /// Mark (`is_marking = true`) or unmark a number on the player's card.
    MarkNumber {
        room_code: RoomCode,
        number: u32,
        client_id: ClientId,
        is_marking: bool,
    },

    /// Claim a completed line.
    ClaimBingo {
        room_code: RoomCode,
        client_id: ClientId,
    },

    /// Post to the room chat. The host posts with its own client id.
    SendChat {
        room_code: RoomCode,
        client_id: ClientId,
        text: String,
    },

    /// Remove a player from the room permanently. Host only.
    BanPlayer {
        room_code: RoomCode,
        client_id: ClientId,
        target_client_id: ClientId,
    },
}

impl ClientEvent {
    /// The room this event is addressed to. `None` for `CreateRoom`.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::CreateRoom { .. } => None,
            Self::StartGame { room_code }
            | Self::DrawNumber { room_code }
            | Self::StartVote { room_code }
            | Self::SubmitVote { room_code, .. }
            | Self::JoinRoom { room_code, .. }
            | Self::Reconnect { room_code, .. }
            | Self::MarkNumber { room_code, .. }
            | Self::ClaimBingo { room_code, .. }
            | Self::SendChat { room_code, .. }
            | Self::BanPlayer { room_code, .. } => Some(room_code),
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::StartGame { .. } => "start_game",
            Self::DrawNumber { .. } => "draw_number",
            Self::StartVote { .. } => "start_vote",
            Self::SubmitVote { .. } => "submit_vote",
            Self::JoinRoom { .. } => "join_room",
            Self::Reconnect { .. } => "reconnect",
            Self::MarkNumber { .. } => "mark_number",
            Self::ClaimBingo { .. } => "claim_bingo",
            Self::SendChat { .. } => "send_chat",
            Self::BanPlayer { .. } => "ban_player",
        }
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One line of the room chat.
///
/// `client_id` is kept server-side so a ban can purge the sender's lines.
/// It is never serialized: other players must not learn durable ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_label: String,
    pub text: String,
    pub is_host: bool,
    pub is_system: bool,
    #[serde(skip)]
    pub client_id: Option<ClientId>,
}

impl ChatMessage {
    /// A notice written by the server itself (bans, etc.).
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender_label: "System".into(),
            text: text.into(),
            is_host: false,
            is_system: true,
            client_id: None,
        }
    }
}

/// One row of the host's leaderboard.
///
/// Carries the client id because the host bans by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub client_id: ClientId,
    pub name: String,
    /// Cells still missing from the player's best line.
    pub to_go: u8,
}

/// Vote counts per letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    #[serde(rename = "B")]
    b: u32,
    #[serde(rename = "I")]
    i: u32,
    #[serde(rename = "N")]
    n: u32,
    #[serde(rename = "G")]
    g: u32,
    #[serde(rename = "O")]
    o: u32,
}

impl VoteTally {
    /// Votes recorded for `letter`.
    pub fn get(&self, letter: Letter) -> u32 {
        match letter {
            Letter::B => self.b,
            Letter::I => self.i,
            Letter::N => self.n,
            Letter::G => self.g,
            Letter::O => self.o,
        }
    }

    /// Adds one vote for `letter`.
    pub fn record(&mut self, letter: Letter) {
        let slot = match letter {
            Letter::B => &mut self.b,
            Letter::I => &mut self.i,
            Letter::N => &mut self.n,
            Letter::G => &mut self.g,
            Letter::O => &mut self.o,
        };
        *slot += 1;
    }

    /// Total votes across all letters.
    pub fn total(&self) -> u32 {
        Letter::ALL.iter().map(|l| self.get(*l)).sum()
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server pushes to browsers, either to one connection or
/// to the whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// The host's room is ready.
    RoomCreated { room_code: RoomCode },

    /// A request was rejected. Sent to the requester only.
    ErrorMessage { text: String },

    /// This connection's client was banned and must leave.
    BannedNotice,

    /// Registration closed; play has begun.
    GameStarted,

    /// A number was drawn. `history` is the full call order.
    NumberDrawn { number: u32, history: Vec<u32> },

    /// The roster size changed.
    PlayerCountUpdated { count: usize },

    /// A player joined or resumed. Carries everything needed to redraw
    /// the board.
    JoinedSuccess {
        room_code: RoomCode,
        card: Card,
        marked_numbers: Vec<u32>,
        chat_history: Vec<ChatMessage>,
        called_numbers: Vec<u32>,
        started: bool,
    },

    /// The host re-attached to its room.
    HostRestored {
        room_code: RoomCode,
        started: bool,
        called_numbers: Vec<u32>,
        winner: Option<String>,
    },

    /// Leaderboard and call history. Host only.
    HostUpdate {
        top_players: Vec<LeaderboardEntry>,
        called_numbers: Vec<u32>,
    },

    /// Someone won. Sent exactly once per room.
    GameOver { winner: String },

    /// A letter vote opened. `deadline_ms` is Unix time in milliseconds.
    VoteStarted { deadline_ms: u64, has_voted: bool },

    /// Live vote counts.
    VoteTallyUpdate { counts: VoteTally },

    /// The vote closed. `None` means nobody voted and the draw is unbiased.
    VoteEnded { letter: Option<Letter> },

    /// A new chat line.
    ChatMessage { message: ChatMessage },

    /// The whole transcript, after a purge or on restore.
    ChatHistoryReplaced { history: Vec<ChatMessage> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str) -> ClientId {
        ClientId::parse(id).unwrap()
    }

    fn code() -> RoomCode {
        RoomCode::parse("AB23C").unwrap()
    }

    #[test]
    fn test_client_event_json_shape() {
        let raw = r#"{"type":"MarkNumber","room_code":"ab23c","number":42,"client_id":"c1","is_marking":true}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::MarkNumber {
                room_code: code(),
                number: 42,
                client_id: client("c1"),
                is_marking: true,
            }
        );
        assert_eq!(event.room_code(), Some(&code()));
        assert_eq!(event.kind(), "mark_number");
    }

    #[test]
    fn test_client_event_rejects_bad_letter() {
        let raw = r#"{"type":"SubmitVote","room_code":"AB23C","letter":"Z","client_id":"c1"}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn test_create_room_has_no_room_code() {
        let event = ClientEvent::CreateRoom {
            credential: "secret".into(),
            client_id: client("host"),
        };
        assert_eq!(event.room_code(), None);
    }

    #[test]
    fn test_chat_message_hides_client_id() {
        let msg = ChatMessage {
            sender_label: "Ana".into(),
            text: "hi".into(),
            is_host: false,
            is_system: false,
            client_id: Some(client("secret-id")),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("secret-id"));
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.client_id, None);
    }

    #[test]
    fn test_vote_tally_record_and_total() {
        let mut tally = VoteTally::default();
        tally.record(Letter::G);
        tally.record(Letter::G);
        tally.record(Letter::B);
        assert_eq!(tally.get(Letter::G), 2);
        assert_eq!(tally.get(Letter::O), 0);
        assert_eq!(tally.total(), 3);

        let json = serde_json::to_value(tally).unwrap();
        assert_eq!(json["G"], 2);
        assert_eq!(json["B"], 1);
    }

    #[test]
    fn test_server_event_unit_variant_shape() {
        let json = serde_json::to_value(&ServerEvent::BannedNotice).unwrap();
        assert_eq!(json["type"], "BannedNotice");
    }

    #[test]
    fn test_vote_ended_without_letter_is_null() {
        let json = serde_json::to_value(&ServerEvent::VoteEnded { letter: None }).unwrap();
        assert_eq!(json["type"], "VoteEnded");
        assert!(json["letter"].is_null());
    }
}
