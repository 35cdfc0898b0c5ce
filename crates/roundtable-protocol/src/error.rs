//! Error types for the protocol layer.
//!
//! Each crate in Roundtable defines its own error enum. A `ProtocolError`
//! always means a problem turning messages into bytes or back, never a
//! problem with rooms or game flow.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a message).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// truncated line in a replay log.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
