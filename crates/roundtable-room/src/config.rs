//! Game configuration and the session state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// What to do with messages addressed to a room whose game has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinishedPolicy {
    /// A join signal discards the old session and starts a brand-new one.
    /// Other text is ignored. If nobody joins within `finished_linger`,
    /// the session retires and its resources are freed.
    #[default]
    Restart,
    /// Everything is ignored until the room is reset from outside
    /// (`Dispatcher::reset_room`).
    Ignore,
}

/// Settings shared by every room session a dispatcher creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Distinct participants required before the first round. At least 2.
    pub min_quorum: usize,

    /// Rounds played per game. At least 1.
    pub rounds_per_game: u32,

    /// How long a round accepts answers.
    pub round_timeout: Duration,

    /// Pause between a round's standings and the next question.
    pub inter_round_delay: Duration,

    /// How long a finished session waits for a new join before retiring.
    /// Only used with [`FinishedPolicy::Restart`].
    pub finished_linger: Duration,

    /// Behavior after a game finishes.
    pub after_finish: FinishedPolicy,

    /// The bot's chat username. When set, `/join@other` is not treated
    /// as a join signal.
    pub bot_name: Option<String>,

    /// Capacity of each session's inbox. At least 1.
    pub inbox_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_quorum: 3,
            rounds_per_game: 3,
            round_timeout: Duration::from_secs(90),
            inter_round_delay: Duration::from_secs(5),
            finished_linger: Duration::from_secs(60),
            after_finish: FinishedPolicy::Restart,
            bot_name: None,
            inbox_capacity: 256,
        }
    }
}

impl GameConfig {
    /// Checks the settings that would make a session unplayable.
    ///
    /// # Errors
    /// Returns the first offending setting as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_quorum < 2 {
            return Err(ConfigError::QuorumTooSmall(self.min_quorum));
        }
        if self.rounds_per_game < 1 {
            return Err(ConfigError::NoRounds);
        }
        if self.round_timeout.is_zero() {
            return Err(ConfigError::ZeroRoundTimeout);
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::ZeroInboxCapacity);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room session.
///
/// ```text
/// Idle → QuorumGathering → RoundActive ⇄ RoundScoring → Finished
///              │                                          ↑
///              └──────────── (no questions) ──────────────┘
/// ```
///
/// The only loop is `RoundScoring → RoundActive`, taken once per
/// additional round. Nothing ever goes back to `Idle` or
/// `QuorumGathering`; `Finished` is terminal. A new game in the same room
/// is a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    QuorumGathering,
    RoundActive,
    RoundScoring,
    Finished,
}

impl SessionState {
    /// Returns `true` if `target` is a legal next state.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, QuorumGathering)
                | (QuorumGathering, RoundActive)
                | (QuorumGathering, Finished)
                | (RoundActive, RoundScoring)
                | (RoundScoring, RoundActive)
                | (RoundScoring, Finished)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::QuorumGathering => write!(f, "QuorumGathering"),
            Self::RoundActive => write!(f, "RoundActive"),
            Self::RoundScoring => write!(f, "RoundScoring"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
