//! Core message types exchanged with the chat transport.
//!
//! Inbound: a line of chat from someone in a room ([`InboundMessage`]).
//! Outbound: a game event for a room ([`Outbound`] wrapping an
//! [`OutboundEvent`]). All of these derive serde so a transport can ship
//! them over whatever wire it likes, and so tests can record a replay.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable unique identifier for a chat participant.
///
/// Chat platforms hand out string ids (numeric or not), so this wraps a
/// `String`. `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// The chat room (group, channel) a message belongs to.
///
/// One room hosts at most one live game session at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Someone who has spoken in a room: their id and the name to show.
///
/// Equality is by id only. Display names change on chat platforms; the
/// first name observed in a session is the one used for that session.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// What kind of chat a room is.
///
/// Games only run in group chats; a private chat with the bot has a
/// single participant and can never reach quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Private,
    #[default]
    Group,
    Supergroup,
    Channel,
}

impl RoomKind {
    /// Returns `true` if this kind of room can host a game.
    pub fn hosts_games(&self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Group => write!(f, "group"),
            Self::Supergroup => write!(f, "supergroup"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// A line of chat, as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Who sent it.
    pub participant: Participant,
    /// Where it was sent.
    pub room_id: RoomId,
    /// What kind of room that is.
    #[serde(default)]
    pub room_kind: RoomKind,
    /// Raw text, untouched.
    pub text: String,
    /// Milliseconds since the Unix epoch, as stamped by the transport.
    #[serde(default)]
    pub received_at: u64,
}

impl InboundMessage {
    /// Builds a group-chat message with a zero timestamp. Handy for tests
    /// and console transports.
    pub fn group(room_id: &str, participant: Participant, text: impl Into<String>) -> Self {
        Self {
            participant,
            room_id: RoomId::new(room_id),
            room_kind: RoomKind::Group,
            text: text.into(),
            received_at: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// One row of the standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub participant: Participant,
    pub score: u32,
}

/// Participant → accumulated score, best first.
///
/// Ties keep the order in which participants first scored, so the same
/// game always produces the same table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Standings(pub Vec<Standing>);

impl Standings {
    /// Score of one participant, if they scored at all.
    pub fn score_of(&self, id: &ParticipantId) -> Option<u32> {
        self.0
            .iter()
            .find(|s| &s.participant.id == id)
            .map(|s| s.score)
    }

    /// Sum of every participant's score.
    pub fn total(&self) -> u32 {
        self.0.iter().map(|s| s.score).fold(0, u32::saturating_add)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Standing> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Why a round stopped accepting answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Every slot was claimed before the deadline.
    AllSlotsClaimed,
    /// The round deadline passed.
    TimedOut,
}

/// Why a session reached `Finished`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// All configured rounds were played.
    Completed,
    /// The question bank ran dry before the last round.
    QuestionsExhausted,
    /// The question bank failed; the message is for operators.
    ProviderFailed(String),
}

/// A game event produced by a room session.
///
/// `#[serde(tag = "type")]` gives `{ "type": "SlotScored", ... }` so a
/// transport can switch on one field when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundEvent {
    /// A new participant opted in; `needed` more are required to start.
    QuorumProgress {
        participant: Participant,
        joined: usize,
        needed: usize,
    },

    /// Quorum reached. `participants` are the joiners in join order.
    GameStarted {
        participants: Vec<Participant>,
        rounds: u32,
    },

    /// A round is open for answers.
    RoundStarted {
        round: u32,
        total_rounds: u32,
        prompt: String,
        slots: usize,
    },

    /// `participant` claimed slot `slot_index` worth `points`.
    SlotScored {
        round: u32,
        participant: Participant,
        points: u32,
        slot_index: usize,
        slot_text: String,
    },

    /// A round closed. `unclaimed` reveals the answers nobody found.
    Standings {
        round: u32,
        outcome: RoundOutcome,
        unclaimed: Vec<String>,
        standings: Standings,
    },

    /// The session is over. Final standings (possibly partial).
    Finished {
        standings: Standings,
        reason: FinishReason,
    },
}

impl OutboundEvent {
    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuorumProgress { .. } => "QuorumProgress",
            Self::GameStarted { .. } => "GameStarted",
            Self::RoundStarted { .. } => "RoundStarted",
            Self::SlotScored { .. } => "SlotScored",
            Self::Standings { .. } => "Standings",
            Self::Finished { .. } => "Finished",
        }
    }
}

/// An event addressed to one room, as delivered to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub room_id: RoomId,
    pub event: OutboundEvent,
}

// =========================================================================
// Tests
// =========================================================================
