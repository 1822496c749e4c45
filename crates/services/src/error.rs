//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::AttemptError;
use storage::bank::BankFormatError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
///
/// Corrupt records are not errors: they are replaced with the empty record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("failed to read progress: {0}")]
    Read(#[source] StorageError),
    #[error("failed to save progress: {0}")]
    Write(#[source] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions available")]
    NoQuestionsAvailable,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted by `ImportService` that abort the whole batch.
///
/// Per-question problems are collected in the `ImportReport` instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error(transparent)]
    Format(#[from] BankFormatError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Bank(#[from] BankFormatError),
    #[error(transparent)]
    InvalidBank(#[from] quiz_core::selection::BankError),
}
