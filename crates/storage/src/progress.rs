use quiz_core::model::{ProgressError, QuestionId, UserProgress};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

/// Fixed key under which the progress record lives in a `KeyValueStore`.
pub const PROGRESS_KEY: &str = "quiz_progress";

/// Persisted shape of `UserProgress`.
///
/// Missing fields read as empty/zero. `lastQuestionId` is omitted when unset so a
/// record written by [`ProgressRecord::encode`] decodes and re-encodes to the
/// same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub answered_questions: Vec<String>,
    pub correct_answers: u32,
    pub total_answers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_question_id: Option<String>,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &UserProgress) -> Self {
        Self {
            answered_questions: progress
                .answered_questions()
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
            correct_answers: progress.correct_answers(),
            total_answers: progress.total_answers(),
            last_question_id: progress.last_question_id().map(|id| id.as_str().to_owned()),
        }
    }

    /// Convert the record back into a domain `UserProgress`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the stored counters contradict each other.
    pub fn into_progress(self) -> Result<UserProgress, ProgressError> {
        UserProgress::from_persisted(
            self.answered_questions
                .into_iter()
                .map(QuestionId::new)
                .collect(),
            self.correct_answers,
            self.total_answers,
            self.last_question_id.map(QuestionId::new),
        )
    }

    /// Convert the record, rebuilding counters that contradict the answered ids.
    #[must_use]
    pub fn into_repaired_progress(self) -> UserProgress {
        UserProgress::repaired(
            self.answered_questions
                .into_iter()
                .map(QuestionId::new)
                .collect(),
            self.correct_answers,
            self.last_question_id.map(QuestionId::new),
        )
    }

    /// Decode a stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for anything that is not a progress object.
    pub fn decode(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|err| StorageError::Serialization(err.to_string()))
    }
}
