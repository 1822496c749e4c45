use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{OPTION_COUNT, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("choice {0} is out of range")]
    ChoiceOutOfRange(usize),
    #[error("no option selected")]
    NothingSelected,
    #[error("answer already revealed")]
    AlreadyRevealed,
}

/// Where a single question instance is in its answering flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Unanswered,
    Selected(usize),
    Revealed { choice: usize, is_correct: bool },
}

/// What gets recorded once an attempt is revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub choice: usize,
    pub is_correct: bool,
}

/// One presentation of a question: pick (and re-pick) an option, then reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    question: Question,
    state: AttemptState,
}

impl QuestionAttempt {
    #[must_use]
    pub fn new(question: Question) -> Self {
        Self {
            question,
            state: AttemptState::Unanswered,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn state(&self) -> AttemptState {
        self.state
    }

    #[must_use]
    pub fn selected_choice(&self) -> Option<usize> {
        match self.state {
            AttemptState::Unanswered => None,
            AttemptState::Selected(choice) | AttemptState::Revealed { choice, .. } => Some(choice),
        }
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self.state, AttemptState::Revealed { .. })
    }

    /// Select an option. May be called repeatedly until the answer is revealed.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::ChoiceOutOfRange` for an index past the last option,
    /// or `AttemptError::AlreadyRevealed` once the attempt is revealed.
    pub fn select(&mut self, choice: usize) -> Result<(), AttemptError> {
        if self.is_revealed() {
            return Err(AttemptError::AlreadyRevealed);
        }
        if choice >= OPTION_COUNT {
            return Err(AttemptError::ChoiceOutOfRange(choice));
        }
        self.state = AttemptState::Selected(choice);
        Ok(())
    }

    /// Lock in the current selection and grade it.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NothingSelected` before any selection, or
    /// `AttemptError::AlreadyRevealed` if called twice.
    pub fn reveal(&mut self) -> Result<AnswerSubmission, AttemptError> {
        let choice = match self.state {
            AttemptState::Unanswered => return Err(AttemptError::NothingSelected),
            AttemptState::Revealed { .. } => return Err(AttemptError::AlreadyRevealed),
            AttemptState::Selected(choice) => choice,
        };
        let is_correct = self.question.is_correct(choice);
        self.state = AttemptState::Revealed { choice, is_correct };

        Ok(AnswerSubmission {
            question_id: self.question.id().clone(),
            choice,
            is_correct,
        })
    }
}
