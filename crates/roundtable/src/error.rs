//! Unified error type for Roundtable.

use roundtable_protocol::ProtocolError;
use roundtable_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roundtable` facade you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoundtableError {
    /// A protocol-level error (encode or decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (configuration, routing, provider, session).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The bot's intake loop has stopped.
    #[error("bot intake is closed")]
    IntakeClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_protocol::{Codec, JsonCodec, Outbound, RoomId};
    use roundtable_room::{ConfigError, RoutingError};

    #[test]
    fn test_from_protocol_error() {
        let err = JsonCodec.decode::<Outbound>(b"not json").unwrap_err();
        let top: RoundtableError = err.into();
        assert!(matches!(top, RoundtableError::Protocol(ProtocolError::Decode(_))));
        assert!(top.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId::new("r9"));
        let top: RoundtableError = err.into();
        assert!(matches!(top, RoundtableError::Room(_)));
        assert!(top.to_string().contains("R-r9"));
    }

    #[test]
    fn test_nested_conversions_keep_the_cause() {
        let top: RoundtableError = RoomError::from(ConfigError::NoRounds).into();
        assert!(top.to_string().contains("rounds_per_game"));

        let top: RoundtableError = RoomError::from(RoutingError::MissingRoom).into();
        assert_eq!(top.to_string(), "message has no room id");
    }
}
