//! Codec trait and implementations for serializing messages.
//!
//! The transport decides how events travel (a chat API, a terminal, a
//! replay file). The core only needs something that implements [`Codec`]
//! so that outbound events and inbound messages can be turned into bytes
//! and back.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a single codec can be shared by the intake
/// loop and any number of delivery tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Encodes a sequence of values as newline-delimited records.
    ///
    /// Used to write a replay log of a session's events: one record per
    /// line, in emission order.
    fn encode_lines<'a, T, I>(&self, values: I) -> Result<Vec<u8>, ProtocolError>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut out = Vec::new();
        for value in values {
            out.extend(self.encode(value)?);
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Decodes newline-delimited records produced by
    /// [`encode_lines`](Self::encode_lines). Blank lines are skipped.
    fn decode_lines<T: DeserializeOwned>(&self, data: &[u8]) -> Result<Vec<T>, ProtocolError> {
        data.split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(|line| self.decode(line))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, which is what a chat transport or a replay file wants.
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use roundtable_protocol::{Codec, JsonCodec, OutboundEvent, Participant};
///
/// let codec = JsonCodec;
/// let event = OutboundEvent::QuorumProgress {
///     participant: Participant::new("42", "Ada"),
///     joined: 1,
///     needed: 3,
/// };
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: OutboundEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{OutboundEvent, Participant};

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result: Result<OutboundEvent, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_lines_writes_one_record_per_line() {
        let events = vec![
            OutboundEvent::QuorumProgress {
                participant: Participant::new("1", "One"),
                joined: 1,
                needed: 2,
            },
            OutboundEvent::GameStarted {
                participants: vec![Participant::new("1", "One"), Participant::new("2", "Two")],
                rounds: 1,
            },
        ];

        let bytes = JsonCodec.encode_lines(&events).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));

        let decoded: Vec<OutboundEvent> = JsonCodec.decode_lines(&bytes).unwrap();
        assert_eq!(decoded, events);
    }

    #[test]
    fn test_decode_lines_skips_blank_lines() {
        let data = b"\n{\"type\":\"GameStarted\",\"participants\":[],\"rounds\":2}\n   \n";
        let decoded: Vec<OutboundEvent> = JsonCodec.decode_lines(data).unwrap();
        assert_eq!(
            decoded,
            vec![OutboundEvent::GameStarted { participants: vec![], rounds: 2 }]
        );
    }
}
