//! Round timers for Roundtable sessions.
//!
//! A session has at most one pending timer: the answer deadline of the
//! current round, the pause between rounds, or the linger period of a
//! finished session. [`RoundScheduler`] owns that single slot.
//!
//! # Delivery
//!
//! Timers never touch session state. When one expires, a [`TimerFired`]
//! message is pushed into the session's own inbox, the same ordered
//! channel that carries player messages, so the session sees expirations
//! interleaved with chat in arrival order.
//!
//! # Generations
//!
//! Every arm or cancel bumps the scheduler's generation. An expiry that
//! was already queued when its timer got replaced still arrives, but
//! carries an old generation and is rejected by [`RoundScheduler::accept`]:
//!
//! ```ignore
//! loop {
//!     match inbox.recv().await {
//!         Some(Input::Timer(fired)) if scheduler.accept(&fired) => { /* act */ }
//!         Some(Input::Timer(_)) => { /* stale, ignore */ }
//!         // ...
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Timer identity
// ---------------------------------------------------------------------------

/// What a timer was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Answer deadline of the active round.
    RoundDeadline,
    /// Pause between a round's standings and the next question.
    InterRoundDelay,
    /// Idle period after a session finished, before it retires.
    Linger,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundDeadline => write!(f, "round-deadline"),
            Self::InterRoundDelay => write!(f, "inter-round-delay"),
            Self::Linger => write!(f, "linger"),
        }
    }
}

/// An expiry notice, delivered through the session inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Generation the timer was armed under.
    pub generation: u64,
    pub kind: TimerKind,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct Pending {
    kind: TimerKind,
    task: JoinHandle<()>,
}

/// Single-slot timer for one session.
///
/// `M` is the session's inbox message type; expiries are converted with
/// `M::from(TimerFired)`. Must be used from within a Tokio runtime.
pub struct RoundScheduler<M> {
    inbox: mpsc::Sender<M>,
    generation: u64,
    pending: Option<Pending>,
}

impl<M> RoundScheduler<M>
where
    M: From<TimerFired> + Send + 'static,
{
    /// Creates an idle scheduler that delivers into `inbox`.
    pub fn new(inbox: mpsc::Sender<M>) -> Self {
        Self {
            inbox,
            generation: 0,
            pending: None,
        }
    }

    /// Arms the answer deadline for the current round, replacing any
    /// pending timer. Returns the new generation.
    pub fn start_round_timer(&mut self, duration: Duration) -> u64 {
        self.arm(TimerKind::RoundDeadline, duration)
    }

    /// Arms the pause before the next round, replacing any pending timer.
    pub fn start_inter_round_delay(&mut self, duration: Duration) -> u64 {
        self.arm(TimerKind::InterRoundDelay, duration)
    }

    /// Arms the idle period of a finished session.
    pub fn start_linger(&mut self, duration: Duration) -> u64 {
        self.arm(TimerKind::Linger, duration)
    }

    /// Cancels the pending timer, if any. An expiry already sitting in
    /// the inbox becomes stale. Returns `true` if a timer was pending.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        match self.pending.take() {
            Some(pending) => {
                pending.task.abort();
                debug!(kind = %pending.kind, generation = self.generation, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Checks an expiry against the current generation.
    ///
    /// Returns `true` (and clears the slot) only for the expiry of the
    /// currently armed timer; anything else is stale.
    pub fn accept(&mut self, fired: &TimerFired) -> bool {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.kind == fired.kind && fired.generation == self.generation);
        if current {
            self.pending = None;
        } else {
            trace!(
                kind = %fired.kind,
                fired_generation = fired.generation,
                generation = self.generation,
                "stale timer expiry discarded"
            );
        }
        current
    }

    fn arm(&mut self, kind: TimerKind, duration: Duration) -> u64 {
        if let Some(previous) = self.pending.take() {
            previous.task.abort();
            trace!(kind = %previous.kind, "pending timer replaced");
        }
        self.generation += 1;

        let fired = TimerFired {
            generation: self.generation,
            kind,
        };
        let inbox = self.inbox.clone();
        let task = tokio::spawn(async move {
            time::sleep(duration).await;
            if inbox.send(M::from(fired)).await.is_err() {
                debug!(%kind, "timer fired after its session closed");
            }
        });

        debug!(
            %kind,
            generation = self.generation,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "timer armed"
        );
        self.pending = Some(Pending { kind, task });
        self.generation
    }
}

impl<M> RoundScheduler<M> {
    /// Current generation. Starts at 0 and only grows.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a timer is armed and has not been accepted yet.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Kind of the armed timer, if any.
    pub fn pending_kind(&self) -> Option<TimerKind> {
        self.pending.as_ref().map(|p| p.kind)
    }
}

impl<M> Drop for RoundScheduler<M> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Msg(TimerFired);

    impl From<TimerFired> for Msg {
        fn from(f: TimerFired) -> Self {
            Msg(f)
        }
    }

    #[tokio::test]
    async fn test_new_scheduler_is_idle() {
        let (tx, _rx) = mpsc::channel::<Msg>(4);
        let s = RoundScheduler::new(tx);
        assert_eq!(s.generation(), 0);
        assert!(!s.is_armed());
        assert_eq!(s.pending_kind(), None);
    }

    #[tokio::test]
    async fn test_cancel_without_pending_still_bumps_generation() {
        let (tx, _rx) = mpsc::channel::<Msg>(4);
        let mut s = RoundScheduler::new(tx);
        assert!(!s.cancel());
        assert_eq!(s.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arming_an_unbounded_timer() {
        let (tx, _rx) = mpsc::channel::<Msg>(4);
        let mut s = RoundScheduler::new(tx);
        let generation = s.start_linger(Duration::MAX);
        assert_eq!(s.pending_kind(), Some(TimerKind::Linger));
        assert!(s.cancel());
        assert!(s.generation() > generation);
    }

    #[test]
    fn test_timer_kind_display() {
        assert_eq!(TimerKind::RoundDeadline.to_string(), "round-deadline");
        assert_eq!(TimerKind::InterRoundDelay.to_string(), "inter-round-delay");
        assert_eq!(TimerKind::Linger.to_string(), "linger");
    }
}
