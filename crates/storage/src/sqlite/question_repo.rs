use async_trait::async_trait;
use quiz_core::model::Question;

use super::SqliteRepository;
use super::mapping::{map_question_row, options_to_json};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let options = options_to_json(question)?;
        let correct_index = i64::try_from(question.correct_index())
            .map_err(|_| StorageError::Serialization("correct_index overflow".into()))?;
        let year = question.provenance().year.map(i64::from);

        sqlx::query(
            r"
            INSERT INTO questions (id, prompt, options, correct_index, explanation, category, difficulty, year, season)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                prompt = excluded.prompt,
                options = excluded.options,
                correct_index = excluded.correct_index,
                explanation = excluded.explanation,
                category = excluded.category,
                difficulty = excluded.difficulty,
                year = excluded.year,
                season = excluded.season
            ",
        )
        .bind(question.id().as_str())
        .bind(question.prompt())
        .bind(options)
        .bind(correct_index)
        .bind(question.explanation())
        .bind(question.category())
        .bind(question.difficulty())
        .bind(year)
        .bind(question.provenance().season.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt, options, correct_index, explanation, category, difficulty, year, season
            FROM questions
            ORDER BY rowid ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        rows.iter().map(map_question_row).collect()
    }
}
