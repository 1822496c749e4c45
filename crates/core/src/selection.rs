//! In-memory question bank and random question selection.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::model::{Question, QuestionId, UserProgress};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),
}

/// Returns one element chosen uniformly at random, or `None` for an empty slice.
pub fn pick_random<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    items.choose(rng)
}

/// The full, immutable collection of questions for a process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(BankError::DuplicateId(question.id().clone()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Questions whose id is not in `answered`, in bank order.
    #[must_use]
    pub fn unanswered(&self, answered: &[QuestionId]) -> Vec<&Question> {
        let answered: HashSet<&QuestionId> = answered.iter().collect();
        self.questions
            .iter()
            .filter(|q| !answered.contains(q.id()))
            .collect()
    }

    #[must_use]
    pub fn by_category(&self, label: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category() == label)
            .collect()
    }

    #[must_use]
    pub fn by_difficulty(&self, label: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.difficulty() == Some(label))
            .collect()
    }

    /// Distinct category labels in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        distinct(self.questions.iter().map(Question::category))
    }

    /// Distinct difficulty labels in first-seen order. Questions without one are skipped.
    #[must_use]
    pub fn difficulties(&self) -> Vec<&str> {
        distinct(self.questions.iter().filter_map(Question::difficulty))
    }

    /// Pick the next question for `progress`.
    ///
    /// Prefers questions not yet answered. Once every question has been answered
    /// the whole bank is eligible again. Returns `None` only when the bank is empty.
    pub fn next_question<R>(&self, progress: &UserProgress, rng: &mut R) -> Option<&Question>
    where
        R: Rng + ?Sized,
    {
        let unanswered = self.unanswered(progress.answered_questions());
        if unanswered.is_empty() {
            return pick_random(&self.questions, rng);
        }
        pick_random(&unanswered, rng).copied()
    }
}

fn distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    labels.filter(|label| seen.insert(*label)).collect()
}
