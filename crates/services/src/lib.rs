#![forbid(unsafe_code)]

pub mod app_services;
mod bounded;
pub mod error;
pub mod import_service;
pub mod progress_service;
pub mod quiz_service;

pub use app_services::{AppServices, BankSource, ServiceOptions};
pub use error::{AppServicesError, ImportError, ProgressServiceError, QuizError};
pub use import_service::{ImportReport, ImportService};
pub use progress_service::{DEFAULT_IO_TIMEOUT, ProgressService};
pub use quiz_service::{AnswerResult, QuizService, QuizStats};
