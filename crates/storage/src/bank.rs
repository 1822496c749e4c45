//! JSON question bank format.
//!
//! Bank files are either `{ "questions": [...] }` or a bare array. Each entry is
//! read through [`RawQuestion`], which accepts an integer or string `id` and
//! either `correctAnswer` or `correct_answer`, then validated by the domain
//! `QuestionDraft`. Unknown fields are ignored.

use std::path::Path;

use quiz_core::QuestionBank;
use quiz_core::model::{Question, QuestionDraft, QuestionError};
use quiz_core::selection::BankError;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while reading a question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankFormatError {
    #[error("failed to read bank file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bank JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bank must be an array or an object with a \"questions\" array")]
    Shape,

    #[error("question #{index} is malformed: {reason}")]
    Record { index: usize, reason: String },

    #[error("question {id} is invalid: {source}")]
    Question {
        id: String,
        #[source]
        source: QuestionError,
    },

    #[error(transparent)]
    Bank(#[from] BankError),
}

/// Identifier as it appears in bank files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// One question entry exactly as written in a bank file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub id: RawId,
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correct_answer")]
    pub correct_answer: i64,
    pub explanation: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub season: Option<String>,
}

impl RawQuestion {
    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            id: self.id.into_string(),
            prompt: self.question,
            options: self.options,
            correct_index: self.correct_answer,
            explanation: self.explanation,
            category: self.category,
            difficulty: self.difficulty,
            year: self.year,
            season: self.season,
        }
    }
}

/// Split a bank document into its individual question entries.
///
/// # Errors
///
/// Returns `BankFormatError::Json` for invalid JSON and `BankFormatError::Shape`
/// when the top level is neither an array nor a `questions` wrapper.
pub fn split_entries(json: &str) -> Result<Vec<Value>, BankFormatError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(BankFormatError::Shape),
        },
        _ => Err(BankFormatError::Shape),
    }
}

/// Decode a single entry into a draft without validating it.
///
/// # Errors
///
/// Returns `BankFormatError::Record` if required fields are missing or mistyped.
pub fn decode_entry(index: usize, entry: Value) -> Result<QuestionDraft, BankFormatError> {
    serde_json::from_value::<RawQuestion>(entry)
        .map(RawQuestion::into_draft)
        .map_err(|err| BankFormatError::Record {
            index,
            reason: err.to_string(),
        })
}

/// Parse and validate every question in a bank document.
///
/// # Errors
///
/// Fails on the first malformed entry, invalid question, or duplicate id.
pub fn parse_bank(json: &str) -> Result<QuestionBank, BankFormatError> {
    let questions = split_entries(json)?
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let draft = decode_entry(index, entry)?;
            let id = draft.id.clone();
            draft
                .validate()
                .map_err(|source| BankFormatError::Question { id, source })
        })
        .collect::<Result<Vec<Question>, _>>()?;

    Ok(QuestionBank::new(questions)?)
}

/// Read and parse a bank file from disk.
///
/// # Errors
///
/// Returns `BankFormatError::Io` if the file cannot be read, otherwise as
/// [`parse_bank`].
pub fn load_bank(path: impl AsRef<Path>) -> Result<QuestionBank, BankFormatError> {
    let raw = std::fs::read_to_string(path)?;
    parse_bank(&raw)
}
