//! # Roundtable
//!
//! Multiplayer trivia for chat rooms.
//!
//! Every group chat gets its own game session: players opt in with
//! `/join`, the game starts once enough of them have joined, and each
//! round asks one question with several creditable answers. The first
//! player to type a correct answer claims it. Rounds end when every answer
//! is claimed or the round timer runs out.
//!
//! The transport (a chat platform adapter) is not part of this crate. It
//! feeds [`InboundMessage`]s in and delivers [`Outbound`] events back out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roundtable::prelude::*;
//!
//! # async fn run(questions: Vec<Question>) -> Result<(), RoundtableError> {
//! let bank = StaticQuestionBank::in_order(questions);
//! let (bot, mut events) = TriviaBot::start(GameConfig::default(), bank)?;
//!
//! bot.submit(InboundMessage::group("chat-1", Participant::new("42", "Ana"), "/join"))
//!     .await?;
//!
//! while let Some(Outbound { room_id, event }) = events.recv().await {
//!     println!("{room_id}: {}", event.kind());
//! }
//! # Ok(())
//! # }
//! ```

mod bot;
mod error;
pub mod telemetry;

pub use bot::TriviaBot;
pub use error::RoundtableError;

pub use roundtable_protocol as protocol;
pub use roundtable_room as room;
pub use roundtable_timer as timer;

pub use roundtable_protocol::{InboundMessage, Outbound, OutboundEvent};

/// Everything needed to embed a bot.
pub mod prelude {
    pub use crate::{RoundtableError, TriviaBot};
    pub use roundtable_protocol::{
        Codec, FinishReason, InboundMessage, JsonCodec, Outbound, OutboundEvent, Participant,
        ParticipantId, RoomId, RoomKind, RoundOutcome, Standing, Standings,
    };
    pub use roundtable_room::{
        AnswerSlot, Dispatcher, FinishedPolicy, GameConfig, ProviderError, Question, QuestionId,
        QuestionProvider, SessionInfo, SessionState, StaticQuestionBank,
    };
}
