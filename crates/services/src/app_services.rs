use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::QuestionBank;
use storage::bank::load_bank;
use storage::repository::{QuestionRepository, Storage};

use crate::bounded::bounded;
use crate::error::AppServicesError;
use crate::import_service::ImportService;
use crate::progress_service::{DEFAULT_IO_TIMEOUT, ProgressService};
use crate::quiz_service::QuizService;

/// Where the question bank for a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    /// A JSON bank file.
    File(PathBuf),
    /// Questions previously imported into the database.
    Store,
}

/// Knobs for assembling services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    pub bank: BankSource,
    pub io_timeout: Duration,
    pub seed: Option<u64>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            bank: BankSource::Store,
            io_timeout: DEFAULT_IO_TIMEOUT,
            seed: None,
        }
    }
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
    progress: Arc<ProgressService>,
    import: Arc<ImportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or loading the bank fails.
    pub async fn new_sqlite(
        db_url: &str,
        options: ServiceOptions,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, options).await
    }

    /// Build services over an already constructed `Storage`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the bank cannot be loaded.
    pub async fn from_storage(
        storage: Storage,
        options: ServiceOptions,
    ) -> Result<Self, AppServicesError> {
        let bank = resolve_bank(&options, storage.questions.as_ref()).await?;
        tracing::info!(questions = bank.len(), source = ?options.bank, "question bank loaded");

        let progress =
            ProgressService::new(Arc::clone(&storage.kv)).with_io_timeout(options.io_timeout);
        let mut quiz = QuizService::new(Arc::new(bank), progress.clone());
        if let Some(seed) = options.seed {
            quiz = quiz.with_seed(seed);
        }
        let import =
            ImportService::new(Arc::clone(&storage.questions)).with_io_timeout(options.io_timeout);

        Ok(Self {
            quiz: Arc::new(quiz),
            progress: Arc::new(progress),
            import: Arc::new(import),
        })
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn import(&self) -> Arc<ImportService> {
        Arc::clone(&self.import)
    }
}

async fn resolve_bank(
    options: &ServiceOptions,
    questions: &dyn QuestionRepository,
) -> Result<QuestionBank, AppServicesError> {
    match &options.bank {
        BankSource::File(path) => Ok(load_bank(path)?),
        BankSource::Store => {
            let stored = bounded(options.io_timeout, questions.list_questions()).await?;
            Ok(QuestionBank::new(stored)?)
        }
    }
}
