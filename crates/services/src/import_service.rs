use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use storage::bank::{decode_entry, split_entries};
use storage::repository::QuestionRepository;

use crate::bounded::bounded;
use crate::error::ImportError;
use crate::progress_service::DEFAULT_IO_TIMEOUT;

/// Outcome of a bulk import. Failed questions never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates question files and upserts them into the question store.
#[derive(Clone)]
pub struct ImportService {
    questions: Arc<dyn QuestionRepository>,
    io_timeout: Duration,
}

impl ImportService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            questions,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Bound each question write by `io_timeout`.
    #[must_use]
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Import every valid question from a JSON document.
    ///
    /// Each entry must carry the full import schema, including `year` and
    /// `season`. Invalid entries and storage failures are collected as
    /// `"Question <id>: <reason>, <reason>"` lines in the report.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Format` only when the document itself is not a
    /// question list.
    pub async fn import_json(&self, json: &str) -> Result<ImportReport, ImportError> {
        let entries = split_entries(json)?;
        tracing::info!(count = entries.len(), "importing questions");

        let mut report = ImportReport::default();
        for (index, entry) in entries.into_iter().enumerate() {
            let label = entry_label(index, &entry);

            let draft = match decode_entry(index, entry) {
                Ok(draft) => draft,
                Err(err) => {
                    report.errors.push(format!("Question {label}: {err}"));
                    continue;
                }
            };

            let problems = draft.import_problems();
            if !problems.is_empty() {
                let reasons: Vec<String> = problems.iter().map(ToString::to_string).collect();
                report
                    .errors
                    .push(format!("Question {label}: {}", reasons.join(", ")));
                continue;
            }

            let question = match draft.validate() {
                Ok(question) => question,
                Err(err) => {
                    report.errors.push(format!("Question {label}: {err}"));
                    continue;
                }
            };

            match bounded(self.io_timeout, self.questions.upsert_question(&question)).await {
                Ok(()) => {
                    report.imported += 1;
                    tracing::debug!(question = %question.id(), "imported question");
                }
                Err(err) => {
                    tracing::error!(
                        question = %question.id(),
                        error = %err,
                        "failed to store question"
                    );
                    report.errors.push(format!("Question {label}: {err}"));
                }
            }
        }

        tracing::info!(
            imported = report.imported,
            failed = report.errors.len(),
            "import finished"
        );
        Ok(report)
    }
}

fn entry_label(index: usize, entry: &Value) -> String {
    match entry.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(id) => id.to_string(),
        None => format!("#{index}"),
    }
}
