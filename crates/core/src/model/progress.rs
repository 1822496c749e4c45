use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a persisted progress record cannot be rehydrated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct answers ({correct}) exceed total answers ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("total answers ({total}) does not match answered questions ({answered})")]
    TotalMismatch { total: u32, answered: usize },

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
}

//
// ─── RECORD OUTCOME ───────────────────────────────────────────────────────────
//

/// Result of applying an answer to a progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The answer was new; carries the updated record.
    Recorded(UserProgress),
    /// The question was already answered; the record is unchanged.
    AlreadyAnswered,
}

//
// ─── USER PROGRESS ────────────────────────────────────────────────────────────
//

/// Cumulative answering history for the single local user.
///
/// Invariants, upheld by every constructor and transition:
/// - `correct_answers <= total_answers`
/// - `total_answers == answered_questions().len()`
/// - no question id appears twice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProgress {
    answered_questions: Vec<QuestionId>,
    correct_answers: u32,
    total_answers: u32,
    last_question_id: Option<QuestionId>,
}

impl UserProgress {
    /// The all-zero/empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a progress record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the stored values break an invariant.
    pub fn from_persisted(
        answered_questions: Vec<QuestionId>,
        correct_answers: u32,
        total_answers: u32,
        last_question_id: Option<QuestionId>,
    ) -> Result<Self, ProgressError> {
        let mut seen = HashSet::with_capacity(answered_questions.len());
        for id in &answered_questions {
            if !seen.insert(id) {
                return Err(ProgressError::DuplicateQuestion(id.clone()));
            }
        }
        if usize::try_from(total_answers).ok() != Some(answered_questions.len()) {
            return Err(ProgressError::TotalMismatch {
                total: total_answers,
                answered: answered_questions.len(),
            });
        }
        if correct_answers > total_answers {
            return Err(ProgressError::CorrectExceedsTotal {
                correct: correct_answers,
                total: total_answers,
            });
        }

        Ok(Self {
            answered_questions,
            correct_answers,
            total_answers,
            last_question_id,
        })
    }

    /// Rebuild a record whose counters disagree with its answered ids.
    ///
    /// Duplicate ids are dropped (first occurrence wins), `total_answers` becomes
    /// the number of remaining ids and `correct_answers` is clamped to it.
    #[must_use]
    pub fn repaired(
        answered_questions: Vec<QuestionId>,
        correct_answers: u32,
        last_question_id: Option<QuestionId>,
    ) -> Self {
        let mut seen = HashSet::with_capacity(answered_questions.len());
        let answered_questions: Vec<QuestionId> = answered_questions
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        let total_answers = u32::try_from(answered_questions.len()).unwrap_or(u32::MAX);

        Self {
            answered_questions,
            correct_answers: correct_answers.min(total_answers),
            total_answers,
            last_question_id,
        }
    }

    /// Answered question ids in the order they were first answered.
    #[must_use]
    pub fn answered_questions(&self) -> &[QuestionId] {
        &self.answered_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn total_answers(&self) -> u32 {
        self.total_answers
    }

    #[must_use]
    pub fn last_question_id(&self) -> Option<&QuestionId> {
        self.last_question_id.as_ref()
    }

    #[must_use]
    pub fn has_answered(&self, id: &QuestionId) -> bool {
        self.answered_questions.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answered_questions.is_empty()
    }

    /// Apply one answer event.
    ///
    /// Pure: `self` is left untouched and the new record is returned inside
    /// `RecordOutcome::Recorded`. Answering an id that is already present yields
    /// `RecordOutcome::AlreadyAnswered`.
    #[must_use]
    pub fn record_answer(&self, question_id: QuestionId, correct: bool) -> RecordOutcome {
        if self.has_answered(&question_id) {
            return RecordOutcome::AlreadyAnswered;
        }

        let mut answered_questions = self.answered_questions.clone();
        answered_questions.push(question_id.clone());

        RecordOutcome::Recorded(Self {
            answered_questions,
            correct_answers: self.correct_answers.saturating_add(u32::from(correct)),
            total_answers: self.total_answers.saturating_add(1),
            last_question_id: Some(question_id),
        })
    }

    /// Percentage of correct answers, rounded half up. Zero when nothing was answered.
    #[must_use]
    pub fn accuracy(&self) -> u8 {
        accuracy_percent(self.correct_answers, self.total_answers)
    }
}

/// Integer percentage `round(100 * correct / total)` with halves rounded up.
///
/// Returns 0 when `total` is 0. `correct` is clamped to `total`.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
