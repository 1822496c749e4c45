use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{QuestionId, RecordOutcome, UserProgress};
use storage::repository::KeyValueStore;
use storage::{PROGRESS_KEY, ProgressRecord};
use tokio::sync::Mutex;

use crate::bounded::bounded;
use crate::error::ProgressServiceError;

/// Default bound on a single storage call.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracks the local user's answering history in a key-value store.
///
/// Writes (`save`, `record_answer`, `reset`) are serialized so overlapping
/// submissions of the same question are counted once.
#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn KeyValueStore>,
    key: String,
    io_timeout: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl ProgressService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: PROGRESS_KEY.to_string(),
            io_timeout: DEFAULT_IO_TIMEOUT,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store the record under a different key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted progress.
    ///
    /// A missing or undecodable record yields the empty record. A record whose
    /// counters contradict its answered ids is rebuilt from those ids.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Read` if the store itself fails or times out.
    pub async fn load(&self) -> Result<UserProgress, ProgressServiceError> {
        let raw = bounded(self.io_timeout, self.store.get(&self.key))
            .await
            .map_err(ProgressServiceError::Read)?;

        let Some(raw) = raw else {
            return Ok(UserProgress::default());
        };

        let record = match ProgressRecord::decode(&raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    reason = %err,
                    "discarding unreadable progress record"
                );
                return Ok(UserProgress::default());
            }
        };

        match record.clone().into_progress() {
            Ok(progress) => Ok(progress),
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    reason = %err,
                    "repairing inconsistent progress record"
                );
                Ok(record.into_repaired_progress())
            }
        }
    }

    /// Persist `progress`, replacing the stored record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Write` if encoding or the store fails.
    pub async fn save(&self, progress: &UserProgress) -> Result<(), ProgressServiceError> {
        let _guard = self.write_lock.lock().await;
        self.write(progress).await
    }

    /// Record the outcome for `question_id` and return the resulting progress.
    ///
    /// Answering a question that is already recorded changes nothing and
    /// returns the current progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if loading or saving fails. Nothing is
    /// persisted in that case.
    pub async fn record_answer(
        &self,
        question_id: QuestionId,
        correct: bool,
    ) -> Result<UserProgress, ProgressServiceError> {
        let _guard = self.write_lock.lock().await;
        let current = self.load().await?;

        match current.record_answer(question_id.clone(), correct) {
            RecordOutcome::AlreadyAnswered => {
                tracing::debug!(question = %question_id, "answer already recorded; ignoring");
                Ok(current)
            }
            RecordOutcome::Recorded(updated) => {
                self.write(&updated).await?;
                tracing::debug!(
                    question = %question_id,
                    correct,
                    total = updated.total_answers(),
                    "answer recorded"
                );
                Ok(updated)
            }
        }
    }

    /// Overwrite the stored record with the empty record and return it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Write` if the store fails.
    pub async fn reset(&self) -> Result<UserProgress, ProgressServiceError> {
        let _guard = self.write_lock.lock().await;
        let empty = UserProgress::default();
        self.write(&empty).await?;
        tracing::info!("progress reset");
        Ok(empty)
    }

    /// Whether `question_id` is already part of the stored progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Read` if the store fails.
    pub async fn is_answered(
        &self,
        question_id: &QuestionId,
    ) -> Result<bool, ProgressServiceError> {
        Ok(self.load().await?.has_answered(question_id))
    }

    /// Percentage of correct answers in `progress` (0-100, halves rounded up).
    #[must_use]
    pub fn accuracy(progress: &UserProgress) -> u8 {
        progress.accuracy()
    }

    async fn write(&self, progress: &UserProgress) -> Result<(), ProgressServiceError> {
        let encoded = ProgressRecord::from_progress(progress)
            .encode()
            .map_err(ProgressServiceError::Write)?;
        bounded(self.io_timeout, self.store.put(&self.key, &encoded))
            .await
            .map_err(ProgressServiceError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{InMemoryRepository, StorageError};

    fn service() -> (InMemoryRepository, ProgressService) {
        let repo = InMemoryRepository::new();
        let svc = ProgressService::new(Arc::new(repo.clone()));
        (repo, svc)
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("disk unplugged".into()))
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }
    }

    struct ReadOnlyStore(InMemoryRepository);

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key).await
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    struct StalledStore;

    #[async_trait]
    impl KeyValueStore for StalledStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn load_without_record_is_empty() {
        let (_repo, svc) = service();
        assert_eq!(svc.load().await.unwrap(), UserProgress::default());
    }

    #[tokio::test]
    async fn undecodable_record_resets_and_inconsistent_record_is_repaired() {
        let (repo, svc) = service();
        repo.put(PROGRESS_KEY, "{ not json").await.unwrap();
        assert_eq!(svc.load().await.unwrap(), UserProgress::default());

        repo.put(
            PROGRESS_KEY,
            r#"{"answeredQuestions":["1"],"correctAnswers":5,"totalAnswers":1}"#,
        )
        .await
        .unwrap();
        let repaired = svc.load().await.unwrap();
        assert_eq!(repaired.total_answers(), 1);
        assert_eq!(repaired.correct_answers(), 1);
    }

    #[tokio::test]
    async fn record_missing_total_keeps_answered_ids() {
        let (repo, svc) = service();
        repo.put(PROGRESS_KEY, r#"{"answeredQuestions":["1","2"],"correctAnswers":1}"#)
            .await
            .unwrap();

        let loaded = svc.load().await.unwrap();
        assert_eq!(loaded.answered_questions(), &[QuestionId::new("1"), QuestionId::new("2")]);
        assert_eq!(loaded.total_answers(), 2);
        assert_eq!(loaded.correct_answers(), 1);

        let updated = svc.record_answer(QuestionId::new("3"), true).await.unwrap();
        assert_eq!(updated.total_answers(), 3);
        assert_eq!(updated.correct_answers(), 2);
        assert_eq!(
            repo.get(PROGRESS_KEY).await.unwrap().as_deref(),
            Some(
                r#"{"answeredQuestions":["1","2","3"],"correctAnswers":2,"totalAnswers":3,"lastQuestionId":"3"}"#
            )
        );
    }

    #[tokio::test]
    async fn record_answer_persists_and_is_idempotent() {
        let (_repo, svc) = service();
        let first = svc.record_answer(QuestionId::new("Q1"), true).await.unwrap();
        assert_eq!(first.total_answers(), 1);
        assert_eq!(first.correct_answers(), 1);

        let second = svc.record_answer(QuestionId::new("Q1"), false).await.unwrap();
        assert_eq!(second, first);

        let loaded = svc.load().await.unwrap();
        assert_eq!(loaded.total_answers(), 1);
        assert_eq!(loaded.correct_answers(), 1);
        assert_eq!(loaded.last_question_id(), Some(&QuestionId::new("Q1")));
        assert!(svc.is_answered(&QuestionId::new("Q1")).await.unwrap());
        assert!(!svc.is_answered(&QuestionId::new("Q2")).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_duplicate_submissions_count_once() {
        let (_repo, svc) = service();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.record_answer(QuestionId::new("same"), true).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let loaded = svc.load().await.unwrap();
        assert_eq!(loaded.total_answers(), 1);
        assert_eq!(loaded.answered_questions().len(), 1);
    }

    #[tokio::test]
    async fn save_of_load_keeps_bytes_identical() {
        let (repo, svc) = service();
        let raw =
            r#"{"answeredQuestions":["2","9"],"correctAnswers":1,"totalAnswers":2,"lastQuestionId":"9"}"#;
        repo.put(PROGRESS_KEY, raw).await.unwrap();

        let loaded = svc.load().await.unwrap();
        svc.save(&loaded).await.unwrap();
        assert_eq!(repo.get(PROGRESS_KEY).await.unwrap().as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let (_repo, svc) = service();
        svc.record_answer(QuestionId::new("1"), true).await.unwrap();
        let reset = svc.reset().await.unwrap();
        assert_eq!(reset, UserProgress::default());
        assert_eq!(svc.load().await.unwrap(), UserProgress::default());
    }

    #[tokio::test]
    async fn custom_key_is_isolated() {
        let repo = InMemoryRepository::new();
        let a = ProgressService::new(Arc::new(repo.clone()));
        let b = ProgressService::new(Arc::new(repo.clone())).with_key("other_profile");
        a.record_answer(QuestionId::new("1"), true).await.unwrap();
        assert_eq!(b.key(), "other_profile");
        assert!(b.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_failures_surface() {
        let svc = ProgressService::new(Arc::new(FailingStore));
        assert!(matches!(
            svc.load().await,
            Err(ProgressServiceError::Read(StorageError::Connection(_)))
        ));
        assert!(matches!(
            svc.record_answer(QuestionId::new("1"), true).await,
            Err(ProgressServiceError::Read(_))
        ));
    }

    #[tokio::test]
    async fn write_failures_surface_and_leave_state_untouched() {
        let inner = InMemoryRepository::new();
        let svc = ProgressService::new(Arc::new(ReadOnlyStore(inner.clone())));

        let err = svc.record_answer(QuestionId::new("1"), true).await.unwrap_err();
        assert!(matches!(err, ProgressServiceError::Write(_)));
        assert!(matches!(
            svc.reset().await,
            Err(ProgressServiceError::Write(_))
        ));
        assert_eq!(inner.get(PROGRESS_KEY).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_times_out() {
        let svc = ProgressService::new(Arc::new(StalledStore))
            .with_io_timeout(Duration::from_millis(50));
        assert!(matches!(
            svc.load().await,
            Err(ProgressServiceError::Read(StorageError::Timeout(_)))
        ));
        assert!(matches!(
            svc.save(&UserProgress::default()).await,
            Err(ProgressServiceError::Write(StorageError::Timeout(_)))
        ));
    }

    #[test]
    fn accuracy_delegates_to_progress() {
        assert_eq!(ProgressService::accuracy(&UserProgress::default()), 0);
    }
}
