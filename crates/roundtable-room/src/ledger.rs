//! Per-session score ledger.

use std::collections::HashMap;

use roundtable_protocol::{Participant, ParticipantId, Standing, Standings};

/// Participant → accumulated points for one session.
///
/// Scores only grow. Entries are kept in the order participants first
/// scored, which is the tie-break used by [`standings`](Self::standings).
#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    entries: Vec<Standing>,
    index: HashMap<ParticipantId, usize>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `points` to `participant` and returns their new total.
    pub fn credit(&mut self, participant: &Participant, points: u32) -> u32 {
        match self.index.get(&participant.id) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.score = entry.score.saturating_add(points);
                entry.score
            }
            None => {
                self.index.insert(participant.id.clone(), self.entries.len());
                self.entries.push(Standing {
                    participant: participant.clone(),
                    score: points,
                });
                points
            }
        }
    }

    pub fn score_of(&self, id: &ParticipantId) -> u32 {
        self.index.get(id).map_or(0, |&i| self.entries[i].score)
    }

    /// Highest score first; ties in first-scored order.
    pub fn standings(&self) -> Standings {
        let mut rows = self.entries.clone();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        Standings(rows)
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|e| e.score).fold(0, u32::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> Participant {
        Participant::new(id, id.to_uppercase())
    }

    #[test]
    fn test_credit_accumulates() {
        let mut ledger = ScoreLedger::new();
        assert_eq!(ledger.credit(&p("a"), 30), 30);
        assert_eq!(ledger.credit(&p("a"), 20), 50);
        assert_eq!(ledger.score_of(&ParticipantId::new("a")), 50);
        assert_eq!(ledger.score_of(&ParticipantId::new("zz")), 0);
    }

    #[test]
    fn test_standings_sorted_with_stable_ties() {
        let mut ledger = ScoreLedger::new();
        ledger.credit(&p("a"), 10);
        ledger.credit(&p("b"), 40);
        ledger.credit(&p("c"), 10);
        ledger.credit(&p("d"), 40);

        let ids: Vec<String> = ledger
            .standings()
            .iter()
            .map(|s| s.participant.id.0.clone())
            .collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
        assert_eq!(ledger.total(), 100);
    }

    #[test]
    fn test_totals_saturate() {
        let mut ledger = ScoreLedger::new();
        ledger.credit(&p("a"), u32::MAX);
        ledger.credit(&p("b"), 5);
        assert_eq!(ledger.total(), u32::MAX);
        assert_eq!(ledger.standings().total(), u32::MAX);
        assert_eq!(ledger.credit(&p("a"), 1), u32::MAX);
    }

    #[test]
    fn test_zero_point_credit_still_lists_participant() {
        let mut ledger = ScoreLedger::new();
        ledger.credit(&p("a"), 0);
        assert!(!ledger.is_empty());
        assert_eq!(ledger.standings().len(), 1);
    }
}
