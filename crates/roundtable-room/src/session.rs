//! Session actor: an isolated Tokio task that owns one room's game.
//!
//! Each room runs in its own task with a single bounded inbox. Chat
//! messages, timer expirations, and info requests all arrive through
//! that inbox, so the [`TriviaGame`] inside only ever sees one input at a
//! time. No state is shared with other rooms; the only way in is the
//! [`SessionHandle`], the only way out is the shared outbound channel.
//!
//! Stopping is the one exception to the single inbox. It travels on a
//! `watch` channel next to it, so a session stuck on a slow provider with
//! a full inbox can still be told to stop.

use std::collections::VecDeque;
use std::sync::Arc;

use roundtable_protocol::{Command, InboundMessage, Outbound, OutboundEvent, RoomId};
use roundtable_timer::{RoundScheduler, TimerFired};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace};

use crate::game::{AnswerEvent, Effect, GameInput, SessionInfo, TriviaGame};
use crate::{GameConfig, QuestionProvider, RoomError};

/// Everything a session's inbox can carry.
#[derive(Debug)]
pub(crate) enum SessionInput {
    /// A line of chat addressed to this room.
    Chat(InboundMessage),

    /// A timer armed by this session's scheduler expired.
    Timer(TimerFired),

    /// Request a snapshot of the session.
    GetInfo { reply: oneshot::Sender<SessionInfo> },
}

impl From<TimerFired> for SessionInput {
    fn from(fired: TimerFired) -> Self {
        Self::Timer(fired)
    }
}

/// Handle to a running session actor.
///
/// Cheap to clone. The [`Dispatcher`](crate::Dispatcher) holds one per
/// room. Dropping every clone stops the session.
#[derive(Clone)]
pub struct SessionHandle {
    room_id: RoomId,
    sender: mpsc::Sender<SessionInput>,
    stop: Arc<watch::Sender<bool>>,
}

impl SessionHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped consuming input.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queues a chat message without waiting.
    ///
    /// # Errors
    /// [`RoomError::Backlogged`] if the inbox is full,
    /// [`RoomError::Unavailable`] if the session has stopped.
    pub fn deliver(&self, msg: InboundMessage) -> Result<(), RoomError> {
        self.sender
            .try_send(SessionInput::Chat(msg))
            .map_err(|e| match e {
                TrySendError::Full(_) => RoomError::Backlogged(self.room_id.clone()),
                TrySendError::Closed(_) => RoomError::Unavailable(self.room_id.clone()),
            })
    }

    /// Requests a snapshot. Answered after everything already queued.
    pub async fn info(&self) -> Result<SessionInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionInput::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tells the session to stop. Never waits, even if the inbox is full.
    ///
    /// The actor consumes nothing after it sees the signal; queued input
    /// is discarded.
    pub fn shutdown(&self) {
        self.stop.send_replace(true);
    }
}

/// The internal session actor state. Runs inside a Tokio task.
struct SessionActor<P: QuestionProvider> {
    room_id: RoomId,
    game: TriviaGame,
    bot_name: Option<String>,
    provider: Arc<P>,
    scheduler: RoundScheduler<SessionInput>,
    inbox: mpsc::Receiver<SessionInput>,
    stop: watch::Receiver<bool>,
    outbound: mpsc::UnboundedSender<Outbound>,
    retired: bool,
}

impl<P: QuestionProvider> SessionActor<P> {
    /// Runs the actor loop until shutdown or retirement.
    async fn run(mut self) {
        info!(room_id = %self.room_id, "session started");

        loop {
            let input = tokio::select! {
                biased;
                _ = self.stop.changed() => {
                    info!(room_id = %self.room_id, "session shutting down");
                    break;
                }
                input = self.inbox.recv() => match input {
                    Some(input) => input,
                    None => break,
                },
            };

            match input {
                SessionInput::Chat(msg) => {
                    let input = self.classify(msg);
                    self.apply(input).await;
                }
                SessionInput::Timer(fired) => {
                    if self.scheduler.accept(&fired) {
                        self.apply(GameInput::TimerExpired(fired.kind)).await;
                    }
                }
                SessionInput::GetInfo { reply } => {
                    let _ = reply.send(self.game.info());
                }
            }

            if self.retired {
                break;
            }
        }

        if self.scheduler.is_armed() {
            debug!(room_id = %self.room_id, timer = ?self.scheduler.pending_kind(), "timer cancelled at stop");
        }
        self.scheduler.cancel();
        self.drain();
        info!(room_id = %self.room_id, state = %self.game.state(), "session stopped");
    }

    /// Turns a chat line into a game input.
    fn classify(&self, msg: InboundMessage) -> GameInput {
        match Command::parse(&msg.text, self.bot_name.as_deref()) {
            Some(Command::Join) => GameInput::Join(msg.participant),
            None => GameInput::Answer(AnswerEvent {
                participant: msg.participant,
                text: msg.text,
                received_at: msg.received_at,
            }),
        }
    }

    /// Feeds one input to the game and carries out the resulting effects,
    /// including any follow-up inputs they produce (drawn questions).
    async fn apply(&mut self, input: GameInput) {
        let mut effects: VecDeque<Effect> = self.game.handle(input).into();

        while let Some(effect) = effects.pop_front() {
            if self.stopping() {
                self.retired = true;
                return;
            }
            match effect {
                Effect::Emit(event) => self.emit(event),
                Effect::DrawQuestion => {
                    let drawn = tokio::select! {
                        biased;
                        _ = self.stop.changed() => {
                            info!(room_id = %self.room_id, "stopped while drawing a question");
                            self.retired = true;
                            return;
                        }
                        drawn = self.provider.next_question(self.game.asked()) => drawn,
                    };
                    effects.extend(self.game.handle(GameInput::QuestionDrawn(drawn)));
                }
                Effect::StartRoundTimer(duration) => {
                    self.scheduler.start_round_timer(duration);
                }
                Effect::StartInterRoundDelay(duration) => {
                    self.scheduler.start_inter_round_delay(duration);
                }
                Effect::StartLinger(duration) => {
                    self.scheduler.start_linger(duration);
                }
                Effect::CancelTimer => {
                    self.scheduler.cancel();
                }
                Effect::Retire => self.retired = true,
            }
        }
    }

    /// `true` once a stop was requested or every handle is gone.
    fn stopping(&self) -> bool {
        *self.stop.borrow() || self.stop.has_changed().is_err()
    }

    /// Sends an event to the transport. Silently drops it if the
    /// transport has gone away.
    fn emit(&self, event: OutboundEvent) {
        trace!(room_id = %self.room_id, kind = event.kind(), "event emitted");
        let outbound = Outbound {
            room_id: self.room_id.clone(),
            event,
        };
        if self.outbound.send(outbound).is_err() {
            debug!(room_id = %self.room_id, "outbound receiver gone, event dropped");
        }
    }

    /// Closes the inbox and discards whatever was still queued.
    fn drain(&mut self) {
        self.inbox.close();
        let mut dropped = 0usize;
        while self.inbox.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(room_id = %self.room_id, dropped, "queued input discarded at stop");
        }
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// The inbox is bounded by `config.inbox_capacity`; when it's full new
/// chat is rejected rather than waited on, so one busy room never holds
/// up routing for the others.
pub(crate) fn spawn_session<P: QuestionProvider>(
    room_id: RoomId,
    config: &GameConfig,
    provider: Arc<P>,
    outbound: mpsc::UnboundedSender<Outbound>,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(config.inbox_capacity);
    let (stop_tx, stop_rx) = watch::channel(false);

    let actor = SessionActor {
        room_id: room_id.clone(),
        game: TriviaGame::new(room_id.clone(), config.clone()),
        bot_name: config.bot_name.clone(),
        provider,
        scheduler: RoundScheduler::new(tx.clone()),
        inbox: rx,
        stop: stop_rx,
        outbound,
        retired: false,
    };

    tokio::spawn(actor.run());

    SessionHandle {
        room_id,
        sender: tx,
        stop: Arc::new(stop_tx),
    }
}
