use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::QuestionBank;
use quiz_core::model::{AnswerSubmission, QuestionAttempt, UserProgress};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::error::QuizError;
use crate::progress_service::ProgressService;

/// Result of submitting an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub submission: AnswerSubmission,
    pub progress: UserProgress,
    pub accuracy: u8,
}

/// Snapshot of the user's standing against the current bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizStats {
    pub answered: u32,
    pub correct: u32,
    pub accuracy: u8,
    pub bank_size: usize,
    pub remaining: usize,
}

/// Drives the question loop: pick the next question, grade it, record it.
#[derive(Clone)]
pub struct QuizService {
    bank: Arc<QuestionBank>,
    progress: ProgressService,
    rng: Arc<Mutex<StdRng>>,
}

impl QuizService {
    /// Create a service whose selection is seeded from the operating system.
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, progress: ProgressService) -> Self {
        Self {
            bank,
            progress,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Replace the generator with one seeded from `seed` for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Start a fresh attempt for the next question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` for an empty bank, or
    /// `QuizError::Progress` if progress cannot be read.
    pub async fn next_question(&self) -> Result<QuestionAttempt, QuizError> {
        let progress = self.progress.load().await?;
        let question = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.bank.next_question(&progress, &mut *rng).cloned()
        };

        match question {
            Some(question) => {
                tracing::debug!(question = %question.id(), "selected question");
                Ok(QuestionAttempt::new(question))
            }
            None => Err(QuizError::NoQuestionsAvailable),
        }
    }

    /// Reveal `attempt` and record its outcome.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Attempt` if nothing is selected or the attempt was
    /// already revealed, and `QuizError::Progress` if recording fails.
    pub async fn submit(&self, attempt: &mut QuestionAttempt) -> Result<AnswerResult, QuizError> {
        let submission = attempt.reveal()?;
        let progress = self
            .progress
            .record_answer(submission.question_id.clone(), submission.is_correct)
            .await?;
        let accuracy = progress.accuracy();

        Ok(AnswerResult {
            submission,
            progress,
            accuracy,
        })
    }

    /// Current totals against the bank.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Progress` if progress cannot be read.
    pub async fn stats(&self) -> Result<QuizStats, QuizError> {
        let progress = self.progress.load().await?;
        Ok(QuizStats {
            answered: progress.total_answers(),
            correct: progress.correct_answers(),
            accuracy: progress.accuracy(),
            bank_size: self.bank.len(),
            remaining: self.bank.unanswered(progress.answered_questions()).len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AttemptError, AttemptState, QuestionDraft, QuestionId};
    use storage::repository::InMemoryRepository;

    fn bank(ids: &[&str]) -> Arc<QuestionBank> {
        let questions = ids
            .iter()
            .map(|id| {
                QuestionDraft {
                    id: (*id).into(),
                    prompt: format!("Prompt {id}"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_index: 0,
                    explanation: "a".into(),
                    category: "General".into(),
                    ..QuestionDraft::default()
                }
                .validate()
                .unwrap()
            })
            .collect();
        Arc::new(QuestionBank::new(questions).unwrap())
    }

    fn service(ids: &[&str]) -> QuizService {
        let progress = ProgressService::new(Arc::new(InMemoryRepository::new()));
        QuizService::new(bank(ids), progress).with_seed(11)
    }

    #[tokio::test]
    async fn empty_bank_reports_no_questions() {
        let svc = service(&[]);
        assert!(matches!(
            svc.next_question().await,
            Err(QuizError::NoQuestionsAvailable)
        ));
    }

    #[tokio::test]
    async fn submit_requires_a_selection() {
        let svc = service(&["1"]);
        let mut attempt = svc.next_question().await.unwrap();
        assert!(matches!(
            svc.submit(&mut attempt).await,
            Err(QuizError::Attempt(AttemptError::NothingSelected))
        ));
        assert!(svc.progress().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_grades_and_records() {
        let svc = service(&["1"]);
        let mut attempt = svc.next_question().await.unwrap();
        attempt.select(2).unwrap();
        attempt.select(0).unwrap();

        let result = svc.submit(&mut attempt).await.unwrap();
        assert!(result.submission.is_correct);
        assert_eq!(result.progress.total_answers(), 1);
        assert_eq!(result.accuracy, 100);
        assert_eq!(
            attempt.state(),
            AttemptState::Revealed { choice: 0, is_correct: true }
        );

        assert!(matches!(
            svc.submit(&mut attempt).await,
            Err(QuizError::Attempt(AttemptError::AlreadyRevealed))
        ));
        assert_eq!(svc.progress().load().await.unwrap().total_answers(), 1);
    }

    #[tokio::test]
    async fn same_seed_selects_the_same_sequence() {
        let ids = ["1", "2", "3", "4", "5", "6"];
        let a = service(&ids);
        let b = service(&ids);
        for _ in 0..4 {
            let qa = a.next_question().await.unwrap();
            let qb = b.next_question().await.unwrap();
            assert_eq!(qa.question().id(), qb.question().id());
        }
    }

    #[tokio::test]
    async fn stats_track_remaining_questions() {
        let svc = service(&["1", "2", "3"]);
        svc.progress()
            .record_answer(QuestionId::new("2"), false)
            .await
            .unwrap();

        let stats = svc.stats().await.unwrap();
        assert_eq!(
            stats,
            QuizStats {
                answered: 1,
                correct: 0,
                accuracy: 0,
                bank_size: 3,
                remaining: 2,
            }
        );
    }
}
