use quiz_core::model::{Question, QuestionDraft};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn options_to_json(question: &Question) -> Result<String, StorageError> {
    serde_json::to_string(question.options()).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;

    QuestionDraft {
        id: row.try_get("id").map_err(ser)?,
        prompt: row.try_get("prompt").map_err(ser)?,
        options,
        correct_index: row.try_get("correct_index").map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        year: row.try_get("year").map_err(ser)?,
        season: row.try_get("season").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}
