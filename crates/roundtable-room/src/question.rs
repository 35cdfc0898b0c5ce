//! Questions and the provider seam.
//!
//! The core never stores questions itself. It asks a [`QuestionProvider`]
//! for the next one, telling it which ids this session has already used.
//! [`StaticQuestionBank`] is an in-memory provider for tests, demos, and
//! small deployments.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::ProviderError;

/// Identifies a question within a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

/// One creditable answer position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSlot {
    /// What gets shown when the slot is claimed or revealed.
    pub text: String,
    /// Other spellings accepted for this slot. The canonical `text` is
    /// always accepted and need not be repeated here.
    #[serde(default)]
    pub variants: Vec<String>,
    /// Points awarded to whoever claims it.
    pub points: u32,
}

impl AnswerSlot {
    pub fn new(text: impl Into<String>, points: u32) -> Self {
        Self {
            text: text.into(),
            variants: Vec::new(),
            points,
        }
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants.extend(variants.into_iter().map(Into::into));
        self
    }

    /// Canonical text followed by the variants.
    pub fn accepted(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.text.as_str()).chain(self.variants.iter().map(String::as_str))
    }
}

/// A question with its ordered answer slots. Immutable once drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub slots: Vec<AnswerSlot>,
}

impl Question {
    pub fn new(id: u64, prompt: impl Into<String>, slots: Vec<AnswerSlot>) -> Self {
        Self {
            id: QuestionId(id),
            prompt: prompt.into(),
            slots,
        }
    }

    /// Sum of all slot points.
    pub fn total_points(&self) -> u32 {
        self.slots.iter().map(|s| s.points).fold(0, u32::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// QuestionProvider
// ---------------------------------------------------------------------------

/// Supplies questions to room sessions.
///
/// Called from inside a room's own task, so a slow provider only delays
/// the room that asked.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use roundtable_room::{AnswerSlot, ProviderError, Question, QuestionId, QuestionProvider};
///
/// struct OneQuestion;
///
/// impl QuestionProvider for OneQuestion {
///     async fn next_question(
///         &self,
///         exclude: &HashSet<QuestionId>,
///     ) -> Result<Question, ProviderError> {
///         if exclude.contains(&QuestionId(1)) {
///             return Err(ProviderError::Exhausted);
///         }
///         Ok(Question::new(1, "Name a flower", vec![AnswerSlot::new("rose", 50)]))
///     }
/// }
/// ```
pub trait QuestionProvider: Send + Sync + 'static {
    /// Returns a question whose id is not in `exclude`.
    ///
    /// # Errors
    /// [`ProviderError::Exhausted`] when nothing is left,
    /// [`ProviderError::Failed`] when the backing store fails.
    fn next_question(
        &self,
        exclude: &HashSet<QuestionId>,
    ) -> impl Future<Output = Result<Question, ProviderError>> + Send;
}

// ---------------------------------------------------------------------------
// StaticQuestionBank
// ---------------------------------------------------------------------------

enum Draw {
    InOrder,
    Random(Mutex<StdRng>),
}

/// An in-memory question bank.
///
/// Draws either in the given order (first question not yet asked) or at
/// random from the questions not yet asked, with a seeded RNG so a run
/// can be repeated exactly.
pub struct StaticQuestionBank {
    questions: Vec<Question>,
    draw: Draw,
}

impl StaticQuestionBank {
    /// Draws questions in the order given.
    pub fn in_order(questions: Vec<Question>) -> Self {
        Self {
            questions,
            draw: Draw::InOrder,
        }
    }

    /// Draws questions at random using a fixed seed.
    pub fn seeded(questions: Vec<Question>, seed: u64) -> Self {
        Self {
            questions,
            draw: Draw::Random(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn pick(&self, exclude: &HashSet<QuestionId>) -> Result<Question, ProviderError> {
        let candidates: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| !exclude.contains(&q.id))
            .collect();
        if candidates.is_empty() {
            return Err(ProviderError::Exhausted);
        }

        let index = match &self.draw {
            Draw::InOrder => 0,
            Draw::Random(rng) => {
                let mut rng = rng
                    .lock()
                    .map_err(|_| ProviderError::Failed("question bank rng poisoned".into()))?;
                rng.random_range(0..candidates.len())
            }
        };
        Ok(candidates[index].clone())
    }
}

impl QuestionProvider for StaticQuestionBank {
    async fn next_question(&self, exclude: &HashSet<QuestionId>) -> Result<Question, ProviderError> {
        self.pick(exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> Vec<Question> {
        (1..=4)
            .map(|i| Question::new(i, format!("q{i}"), vec![AnswerSlot::new(format!("a{i}"), 10)]))
            .collect()
    }

    #[test]
    fn test_slot_accepts_canonical_then_variants() {
        let slot = AnswerSlot::new("rose", 50).with_variants(["roses", "mawar"]);
        let accepted: Vec<&str> = slot.accepted().collect();
        assert_eq!(accepted, vec!["rose", "roses", "mawar"]);
    }

    #[test]
    fn test_total_points() {
        let q = Question::new(
            1,
            "flowers",
            vec![AnswerSlot::new("rose", 50), AnswerSlot::new("tulip", 30)],
        );
        assert_eq!(q.total_points(), 80);
    }

    #[test]
    fn test_total_points_saturates() {
        let q = Question::new(
            1,
            "huge",
            vec![AnswerSlot::new("a", u32::MAX), AnswerSlot::new("b", 1)],
        );
        assert_eq!(q.total_points(), u32::MAX);
    }

    #[tokio::test]
    async fn test_in_order_skips_excluded() {
        let bank = StaticQuestionBank::in_order(bank());
        let mut asked = HashSet::new();
        for expected in 1..=4 {
            let q = bank.next_question(&asked).await.unwrap();
            assert_eq!(q.id, QuestionId(expected));
            asked.insert(q.id);
        }
        assert_eq!(bank.next_question(&asked).await, Err(ProviderError::Exhausted));
    }

    #[tokio::test]
    async fn test_seeded_draws_are_repeatable_and_never_repeat() {
        let a = StaticQuestionBank::seeded(bank(), 7);
        let b = StaticQuestionBank::seeded(bank(), 7);
        let mut asked_a = HashSet::new();
        let mut asked_b = HashSet::new();
        for _ in 0..4 {
            let qa = a.next_question(&asked_a).await.unwrap();
            let qb = b.next_question(&asked_b).await.unwrap();
            assert_eq!(qa.id, qb.id);
            assert!(asked_a.insert(qa.id), "question drawn twice");
            asked_b.insert(qb.id);
        }
        assert_eq!(a.next_question(&asked_a).await, Err(ProviderError::Exhausted));
    }

    #[tokio::test]
    async fn test_empty_bank_is_exhausted() {
        let bank = StaticQuestionBank::in_order(Vec::new());
        assert!(bank.is_empty());
        assert_eq!(bank.next_question(&HashSet::new()).await, Err(ProviderError::Exhausted));
    }
}
