//! The per-room trivia state machine.
//!
//! [`TriviaGame`] is pure: it consumes one [`GameInput`] at a time and
//! returns the [`Effect`]s the owning session must carry out (emit an
//! event, fetch a question, arm a timer). It never awaits, never spawns,
//! and never reads a clock, so feeding it the same inputs always produces
//! the same effects. The session actor in `session.rs` is the only thing
//! that talks to the outside world.

use std::collections::HashSet;
use std::time::Duration;

use roundtable_protocol::{
    FinishReason, OutboundEvent, Participant, ParticipantId, RoomId, RoundOutcome, Standings,
};
use roundtable_timer::TimerKind;
use tracing::{debug, error, info, trace, warn};

use crate::{
    AnswerMatcher, FinishedPolicy, GameConfig, ProviderError, Question, QuestionId, QuorumCollector,
    QuorumOffer, RoomError, ScoreLedger, SessionState,
};

/// A submitted line of text that might be an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvent {
    pub participant: Participant,
    pub text: String,
    /// Milliseconds since the Unix epoch, from the transport.
    pub received_at: u64,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameInput {
    /// A join signal (`/join`).
    Join(Participant),
    /// Any other text.
    Answer(AnswerEvent),
    /// Result of a [`Effect::DrawQuestion`] request.
    QuestionDrawn(Result<Question, ProviderError>),
    /// A current (non-stale) timer expired.
    TimerExpired(TimerKind),
}

/// What the session must do after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver an event to the room.
    Emit(OutboundEvent),
    /// Ask the provider for a question not in [`TriviaGame::asked`] and
    /// feed the result back as [`GameInput::QuestionDrawn`].
    DrawQuestion,
    StartRoundTimer(Duration),
    StartInterRoundDelay(Duration),
    StartLinger(Duration),
    /// Cancel whatever timer is pending.
    CancelTimer,
    /// The session is done for good; stop consuming input.
    Retire,
}

/// A snapshot of a session, for operators and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub room_id: RoomId,
    pub state: SessionState,
    /// Rounds started so far (the current round while one is open).
    pub round: u32,
    pub quorum_count: usize,
    /// Slots still open in the current round (0 outside a round).
    pub open_slots: usize,
    pub standings: Standings,
}

struct OpenRound {
    question: Question,
    matcher: AnswerMatcher,
    /// Who claimed each slot. `None` = still open.
    claims: Vec<Option<ParticipantId>>,
}

impl OpenRound {
    fn new(question: Question) -> Self {
        Self {
            matcher: AnswerMatcher::new(&question),
            claims: vec![None; question.slots.len()],
            question,
        }
    }

    fn open_slots(&self) -> usize {
        self.claims.iter().filter(|c| c.is_none()).count()
    }

    fn unclaimed_texts(&self) -> Vec<String> {
        self.question
            .slots
            .iter()
            .zip(&self.claims)
            .filter(|(_, claim)| claim.is_none())
            .map(|(slot, _)| slot.text.clone())
            .collect()
    }
}

/// Game state for one room.
pub struct TriviaGame {
    room_id: RoomId,
    config: GameConfig,
    state: SessionState,
    quorum: QuorumCollector,
    ledger: ScoreLedger,
    asked: HashSet<QuestionId>,
    round: u32,
    open: Option<OpenRound>,
    /// A `DrawQuestion` is outstanding.
    drawing: bool,
}

impl TriviaGame {
    pub fn new(room_id: RoomId, config: GameConfig) -> Self {
        Self {
            room_id,
            quorum: QuorumCollector::new(config.min_quorum),
            config,
            state: SessionState::Idle,
            ledger: ScoreLedger::new(),
            asked: HashSet::new(),
            round: 0,
            open: None,
            drawing: false,
        }
    }

    /// Consumes one input and returns the effects to carry out, in order.
    pub fn handle(&mut self, input: GameInput) -> Vec<Effect> {
        let mut fx = Vec::new();
        match input {
            GameInput::Join(participant) => self.on_join(participant, &mut fx),
            GameInput::Answer(answer) => self.on_answer(answer, &mut fx),
            GameInput::QuestionDrawn(result) => self.on_question(result, &mut fx),
            GameInput::TimerExpired(kind) => self.on_timer(kind, &mut fx),
        }
        fx
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Question ids used so far this session.
    pub fn asked(&self) -> &HashSet<QuestionId> {
        &self.asked
    }

    pub fn standings(&self) -> Standings {
        self.ledger.standings()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            room_id: self.room_id.clone(),
            state: self.state,
            round: self.round,
            quorum_count: self.quorum.count(),
            open_slots: self.open.as_ref().map_or(0, OpenRound::open_slots),
            standings: self.ledger.standings(),
        }
    }

    // -----------------------------------------------------------------------
    // Joins and quorum
    // -----------------------------------------------------------------------

    fn on_join(&mut self, participant: Participant, fx: &mut Vec<Effect>) {
        match self.state {
            SessionState::Idle => {
                self.transition(SessionState::QuorumGathering);
                self.offer(participant, fx);
            }
            SessionState::QuorumGathering => self.offer(participant, fx),
            SessionState::RoundActive | SessionState::RoundScoring => {
                debug!(room_id = %self.room_id, participant = %participant.id, "join ignored, game in progress");
            }
            SessionState::Finished => match self.config.after_finish {
                FinishedPolicy::Restart => {
                    info!(room_id = %self.room_id, "finished room rejoined, starting a new session");
                    *self = Self::new(self.room_id.clone(), self.config.clone());
                    fx.push(Effect::CancelTimer);
                    self.on_join(participant, fx);
                }
                FinishedPolicy::Ignore => {
                    debug!(room_id = %self.room_id, participant = %participant.id, "join ignored, room finished");
                }
            },
        }
    }

    fn offer(&mut self, participant: Participant, fx: &mut Vec<Effect>) {
        match self.quorum.offer(&participant) {
            QuorumOffer::Counted { count, needed } => {
                info!(
                    room_id = %self.room_id,
                    participant = %participant.id,
                    joined = count,
                    needed,
                    "participant joined"
                );
                fx.push(Effect::Emit(OutboundEvent::QuorumProgress {
                    participant,
                    joined: count,
                    needed,
                }));
            }
            QuorumOffer::AlreadyCounted { count } => {
                debug!(room_id = %self.room_id, participant = %participant.id, joined = count, "duplicate join ignored");
            }
            QuorumOffer::Reached { count } => {
                info!(room_id = %self.room_id, participants = count, "quorum reached, game starting");
                fx.push(Effect::Emit(OutboundEvent::GameStarted {
                    participants: self.quorum.members().to_vec(),
                    rounds: self.config.rounds_per_game,
                }));
                self.request_question(fx);
            }
            QuorumOffer::Closed { .. } => {
                debug!(room_id = %self.room_id, participant = %participant.id, "join after quorum ignored");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rounds
    // -----------------------------------------------------------------------

    fn request_question(&mut self, fx: &mut Vec<Effect>) {
        self.drawing = true;
        fx.push(Effect::DrawQuestion);
    }

    fn on_question(&mut self, result: Result<Question, ProviderError>, fx: &mut Vec<Effect>) {
        if !self.drawing {
            warn!(room_id = %self.room_id, "question arrived without a request, ignoring");
            return;
        }
        self.drawing = false;

        match result {
            Ok(question) if question.slots.is_empty() => {
                if !self.asked.insert(question.id) {
                    self.abort(ProviderError::Failed(format!("provider repeated question {}", question.id)), fx);
                    return;
                }
                warn!(room_id = %self.room_id, question = %question.id, "question has no answer slots, drawing another");
                self.request_question(fx);
            }
            Ok(question) => self.begin_round(question, fx),
            Err(e) => self.abort(e, fx),
        }
    }

    fn begin_round(&mut self, question: Question, fx: &mut Vec<Effect>) {
        if !self.asked.insert(question.id) {
            warn!(room_id = %self.room_id, question = %question.id, "provider returned an excluded question");
        }
        self.round += 1;
        self.transition(SessionState::RoundActive);
        info!(
            room_id = %self.room_id,
            round = self.round,
            question = %question.id,
            slots = question.slots.len(),
            points = question.total_points(),
            "round started"
        );

        fx.push(Effect::Emit(OutboundEvent::RoundStarted {
            round: self.round,
            total_rounds: self.config.rounds_per_game,
            prompt: question.prompt.clone(),
            slots: question.slots.len(),
        }));
        fx.push(Effect::StartRoundTimer(self.config.round_timeout));
        self.open = Some(OpenRound::new(question));
    }

    fn on_answer(&mut self, answer: AnswerEvent, fx: &mut Vec<Effect>) {
        if self.state != SessionState::RoundActive {
            trace!(room_id = %self.room_id, state = %self.state, "text outside an active round ignored");
            return;
        }
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let Some(slot) = open.matcher.find(&answer.text, |i| open.claims[i].is_none()) else {
            trace!(room_id = %self.room_id, participant = %answer.participant.id, "no match");
            return;
        };

        let (points, slot_text) = match self.claim(slot, &answer.participant) {
            Ok(claimed) => claimed,
            Err(e) => {
                error!(error = %e, "credit invariant violated, submission dropped");
                return;
            }
        };
        let total = self.ledger.credit(&answer.participant, points);
        info!(
            room_id = %self.room_id,
            round = self.round,
            participant = %answer.participant.id,
            slot,
            points,
            total,
            received_at = answer.received_at,
            "slot scored"
        );
        fx.push(Effect::Emit(OutboundEvent::SlotScored {
            round: self.round,
            participant: answer.participant,
            points,
            slot_index: slot,
            slot_text,
        }));

        if self.open.as_ref().is_some_and(|o| o.open_slots() == 0) {
            fx.push(Effect::CancelTimer);
            self.end_round(RoundOutcome::AllSlotsClaimed, fx);
        }
    }

    /// Closes `slot` for `participant`. First claim wins; a second claim
    /// is an invariant violation.
    fn claim(&mut self, slot: usize, participant: &Participant) -> Result<(u32, String), RoomError> {
        let claimed = self.open.as_mut().and_then(|open| {
            let claim = open.claims.get_mut(slot)?;
            if claim.is_some() {
                return None;
            }
            *claim = Some(participant.id.clone());
            let def = &open.question.slots[slot];
            Some((def.points, def.text.clone()))
        });
        claimed.ok_or_else(|| RoomError::DuplicateCredit {
            room_id: self.room_id.clone(),
            round: self.round,
            slot,
        })
    }

    fn end_round(&mut self, outcome: RoundOutcome, fx: &mut Vec<Effect>) {
        let unclaimed = self
            .open
            .take()
            .map(|open| open.unclaimed_texts())
            .unwrap_or_default();
        self.transition(SessionState::RoundScoring);
        info!(
            room_id = %self.room_id,
            round = self.round,
            ?outcome,
            unclaimed = unclaimed.len(),
            "round ended"
        );

        fx.push(Effect::Emit(OutboundEvent::Standings {
            round: self.round,
            outcome,
            unclaimed,
            standings: self.ledger.standings(),
        }));

        if self.round < self.config.rounds_per_game {
            fx.push(Effect::StartInterRoundDelay(self.config.inter_round_delay));
        } else {
            self.finish(FinishReason::Completed, fx);
        }
    }

    fn on_timer(&mut self, kind: TimerKind, fx: &mut Vec<Effect>) {
        match (kind, self.state) {
            (TimerKind::RoundDeadline, SessionState::RoundActive) => {
                self.end_round(RoundOutcome::TimedOut, fx);
            }
            (TimerKind::InterRoundDelay, SessionState::RoundScoring) => {
                self.request_question(fx);
            }
            (TimerKind::Linger, SessionState::Finished)
                if self.config.after_finish == FinishedPolicy::Restart =>
            {
                info!(room_id = %self.room_id, "finished session retiring");
                fx.push(Effect::Retire);
            }
            (kind, state) => {
                debug!(room_id = %self.room_id, %kind, %state, "timer ignored in this state");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Ending
    // -----------------------------------------------------------------------

    fn abort(&mut self, cause: ProviderError, fx: &mut Vec<Effect>) {
        warn!(room_id = %self.room_id, round = self.round, error = %cause, "no question available, ending session");
        let reason = match cause {
            ProviderError::Exhausted => FinishReason::QuestionsExhausted,
            ProviderError::Failed(message) => FinishReason::ProviderFailed(message),
        };
        self.finish(reason, fx);
    }

    fn finish(&mut self, reason: FinishReason, fx: &mut Vec<Effect>) {
        self.transition(SessionState::Finished);
        info!(room_id = %self.room_id, rounds = self.round, ?reason, "game finished");
        fx.push(Effect::Emit(OutboundEvent::Finished {
            standings: self.ledger.standings(),
            reason,
        }));
        if self.config.after_finish == FinishedPolicy::Restart {
            fx.push(Effect::StartLinger(self.config.finished_linger));
        }
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            error!(room_id = %self.room_id, from = %self.state, to = %next, "illegal session transition refused");
            return;
        }
        debug!(room_id = %self.room_id, from = %self.state, to = %next, "session transition");
        self.state = next;
    }
}
