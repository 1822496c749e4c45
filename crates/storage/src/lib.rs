#![forbid(unsafe_code)]

pub mod bank;
pub mod progress;
pub mod repository;
pub mod sqlite;

pub use progress::{PROGRESS_KEY, ProgressRecord};
pub use repository::{InMemoryRepository, KeyValueStore, QuestionRepository, Storage, StorageError};
