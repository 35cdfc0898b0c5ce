//! Quorum formation: who has opted in to the next game.

use std::collections::HashSet;

use roundtable_protocol::{Participant, ParticipantId};

/// Result of offering a join signal to a [`QuorumCollector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumOffer {
    /// Newly counted; `count` of the threshold so far.
    Counted { count: usize, needed: usize },
    /// This participant was already counted. No change.
    AlreadyCounted { count: usize },
    /// This offer completed the quorum. Reported exactly once.
    Reached { count: usize },
    /// Quorum was reached earlier; offers are ignored.
    Closed { count: usize },
}

impl QuorumOffer {
    /// `true` only for the offer that completed the quorum.
    pub fn reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }

    pub fn count(&self) -> usize {
        match *self {
            Self::Counted { count, .. }
            | Self::AlreadyCounted { count }
            | Self::Reached { count }
            | Self::Closed { count } => count,
        }
    }
}

/// Accumulates distinct participants until `threshold` is met.
#[derive(Debug, Clone)]
pub struct QuorumCollector {
    threshold: usize,
    seen: HashSet<ParticipantId>,
    /// Joiners in join order.
    members: Vec<Participant>,
}

impl QuorumCollector {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            seen: HashSet::with_capacity(threshold),
            members: Vec::with_capacity(threshold),
        }
    }

    /// Offers a join signal from `participant`.
    pub fn offer(&mut self, participant: &Participant) -> QuorumOffer {
        let count = self.members.len();
        if self.is_reached() {
            return QuorumOffer::Closed { count };
        }
        if !self.seen.insert(participant.id.clone()) {
            return QuorumOffer::AlreadyCounted { count };
        }

        self.members.push(participant.clone());
        let count = self.members.len();
        if count == self.threshold {
            QuorumOffer::Reached { count }
        } else {
            QuorumOffer::Counted {
                count,
                needed: self.threshold - count,
            }
        }
    }

    pub fn is_reached(&self) -> bool {
        self.members.len() >= self.threshold
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> Participant {
        Participant::new(id, format!("Player {id}"))
    }

    #[test]
    fn test_reached_on_nth_distinct_offer() {
        let mut q = QuorumCollector::new(3);
        assert_eq!(q.offer(&p("1")), QuorumOffer::Counted { count: 1, needed: 2 });
        assert_eq!(q.offer(&p("2")), QuorumOffer::Counted { count: 2, needed: 1 });
        assert_eq!(q.offer(&p("3")), QuorumOffer::Reached { count: 3 });
        assert!(q.is_reached());
    }

    #[test]
    fn test_duplicates_do_not_advance() {
        let mut q = QuorumCollector::new(2);
        q.offer(&p("1"));
        for _ in 0..3 {
            assert_eq!(q.offer(&p("1")), QuorumOffer::AlreadyCounted { count: 1 });
        }
        assert!(!q.is_reached());
        assert!(q.offer(&p("2")).reached());
    }

    #[test]
    fn test_offers_after_quorum_are_closed() {
        let mut q = QuorumCollector::new(2);
        q.offer(&p("1"));
        q.offer(&p("2"));
        let late = q.offer(&p("3"));
        assert_eq!(late, QuorumOffer::Closed { count: 2 });
        assert!(!late.reached());
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn test_members_keep_join_order() {
        let mut q = QuorumCollector::new(3);
        for id in ["b", "a", "b", "c"] {
            q.offer(&p(id));
        }
        let ids: Vec<&str> = q.members().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
