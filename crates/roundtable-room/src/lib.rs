//! Room sessions for Roundtable.
//!
//! Each chat room that hosts a game gets one session: an isolated Tokio
//! task that owns the room's quorum, questions, and scores. Sessions
//! never share state; the [`Dispatcher`] only decides which inbox a
//! message goes to.
//!
//! # Key types
//!
//! - [`Dispatcher`] — creates sessions on demand and routes chat to them
//! - [`TriviaGame`] — the pure per-room state machine
//! - [`SessionHandle`] — send input to a running session actor
//! - [`SessionState`] — lifecycle state machine
//! - [`GameConfig`] — quorum size, rounds, and timings
//! - [`QuestionProvider`] — where questions come from

mod config;
mod dispatcher;
mod error;
mod game;
mod ledger;
mod matcher;
mod question;
mod quorum;
mod session;

pub use config::{FinishedPolicy, GameConfig, SessionState};
pub use dispatcher::{Dispatcher, Routed};
pub use error::{ConfigError, ProviderError, RoomError, RoutingError};
pub use game::{AnswerEvent, Effect, GameInput, SessionInfo, TriviaGame};
pub use ledger::ScoreLedger;
pub use matcher::{AnswerMatcher, normalize};
pub use question::{AnswerSlot, Question, QuestionId, QuestionProvider, StaticQuestionBank};
pub use quorum::{QuorumCollector, QuorumOffer};
pub use session::SessionHandle;
