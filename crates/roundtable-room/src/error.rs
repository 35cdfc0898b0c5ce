//! Error types for the room layer.

use roundtable_protocol::{RoomId, RoomKind};

/// Invalid game settings. Fatal when a dispatcher is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("min_quorum must be at least 2, got {0}")]
    QuorumTooSmall(usize),

    #[error("rounds_per_game must be at least 1")]
    NoRounds,

    #[error("round_timeout must be greater than zero")]
    ZeroRoundTimeout,

    #[error("inbox_capacity must be at least 1")]
    ZeroInboxCapacity,
}

/// Failures reported by a [`QuestionProvider`](crate::QuestionProvider).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Every question has already been asked in this session.
    #[error("no more questions")]
    Exhausted,

    /// The backing store failed.
    #[error("question provider failed: {0}")]
    Failed(String),
}

/// An inbound message that can't be routed to any room. Dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("message has no room id")]
    MissingRoom,

    #[error("message in room {0} has no participant id")]
    MissingParticipant(RoomId),

    #[error("room {1} is a {0} chat, games only run in groups")]
    UnsupportedRoomKind(RoomKind, RoomId),
}

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A slot was about to be credited twice. Never shown to players.
    #[error("slot {slot} of round {round} in room {room_id} was already credited")]
    DuplicateCredit {
        room_id: RoomId,
        round: u32,
        slot: usize,
    },

    /// No live session for this room.
    #[error("room {0} has no session")]
    NotFound(RoomId),

    /// The session's inbox is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The session's inbox is full; the message was dropped.
    #[error("room {0} is backlogged")]
    Backlogged(RoomId),
}
