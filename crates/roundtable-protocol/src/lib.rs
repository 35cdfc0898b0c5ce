//! Message shapes for Roundtable.
//!
//! This crate defines everything that crosses the boundary between the
//! chat transport and the game core:
//!
//! - **Types** ([`InboundMessage`], [`Outbound`], [`OutboundEvent`],
//!   [`Participant`], [`RoomId`], etc.) — what the transport hands us and
//!   what we hand back.
//! - **Commands** ([`Command`]) — the handful of slash commands the core
//!   reacts to. Every other line of chat is an answer candidate.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are turned
//!   into bytes for delivery or for recording a replay log.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (chat platform) → Protocol (InboundMessage) → Room sessions
//! Room sessions → Protocol (Outbound) → Transport
//! ```
//!
//! The protocol layer knows nothing about rooms, timers, or scoring.

mod codec;
mod command;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::Command;
pub use error::ProtocolError;
pub use types::{
    FinishReason, InboundMessage, Outbound, OutboundEvent, Participant,
    ParticipantId, RoomId, RoomKind, RoundOutcome, Standing, Standings,
};
