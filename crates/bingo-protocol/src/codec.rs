//! Codecs turn wire frames into [`ClientEvent`]s and [`ServerEvent`]s into
//! frames.
//!
//! The rest of the server only ever sees typed events. Swapping the wire
//! format means implementing [`Codec`] once.

use crate::{ClientEvent, ProtocolError, ServerEvent};

/// Decodes inbound frames and encodes outbound events.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Parses one inbound frame.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] for malformed frames, unknown event
    /// types, or invalid identifiers.
    fn decode(&self, frame: &[u8]) -> Result<ClientEvent, ProtocolError>;

    /// Serializes one outbound event.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the event cannot be represented.
    fn encode(&self, event: &ServerEvent) -> Result<String, ProtocolError>;
}

/// JSON codec. Browsers send and receive text frames of JSON objects.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn decode(&self, frame: &[u8]) -> Result<ClientEvent, ProtocolError> {
        serde_json::from_slice(frame).map_err(ProtocolError::Decode)
    }

    fn encode(&self, event: &ServerEvent) -> Result<String, ProtocolError> {
        serde_json::to_string(event).map_err(ProtocolError::Encode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientId, RoomCode};

    #[test]
    fn test_json_codec_decodes_join() {
        let frame = br#"{"type":"JoinRoom","room_code":"QQ7QQ","name":"Ana","client_id":"c-1"}"#;
        let event = JsonCodec.decode(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_code: RoomCode::parse("QQ7QQ").unwrap(),
                name: "Ana".into(),
                client_id: ClientId::parse("c-1").unwrap(),
            }
        );
    }

    #[test]
    fn test_json_codec_rejects_unknown_type() {
        let err = JsonCodec.decode(br#"{"type":"Teleport"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_json_codec_rejects_bad_room_code() {
        let frame = br#"{"type":"StartGame","room_code":"nope"}"#;
        assert!(JsonCodec.decode(frame).is_err());
    }

    #[test]
    fn test_json_codec_encodes_text() {
        let text = JsonCodec
            .encode(&ServerEvent::NumberDrawn {
                number: 9,
                history: vec![4, 9],
            })
            .unwrap();
        assert_eq!(text, r#"{"type":"NumberDrawn","number":9,"history":[4,9]}"#);
    }
}
