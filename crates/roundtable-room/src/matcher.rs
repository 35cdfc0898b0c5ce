//! Free-text answer matching.

use std::collections::HashSet;

use crate::Question;

/// Canonical form used for comparison: trimmed, lowercased, with runs of
/// whitespace collapsed to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Matches submissions against one question's slots.
///
/// Built once per round from the drawn question. Holds only normalized
/// copies of the accepted texts; which slots are still open is the
/// caller's business, passed in on every lookup.
#[derive(Debug, Clone)]
pub struct AnswerMatcher {
    accepted: Vec<HashSet<String>>,
}

impl AnswerMatcher {
    pub fn new(question: &Question) -> Self {
        let accepted = question
            .slots
            .iter()
            .map(|slot| {
                slot.accepted()
                    .map(normalize)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .collect();
        Self { accepted }
    }

    /// Number of slots in the question.
    pub fn slot_count(&self) -> usize {
        self.accepted.len()
    }

    /// Returns the first open slot that accepts `submitted`.
    ///
    /// `is_open(i)` tells whether slot `i` can still be claimed. Blank
    /// submissions never match.
    pub fn find(&self, submitted: &str, is_open: impl Fn(usize) -> bool) -> Option<usize> {
        let needle = normalize(submitted);
        if needle.is_empty() {
            return None;
        }
        self.accepted
            .iter()
            .enumerate()
            .find(|(i, set)| is_open(*i) && set.contains(&needle))
            .map(|(i, _)| i)
    }
}
