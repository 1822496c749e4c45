use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every question offers exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a question draft can be rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("missing id")]
    MissingId,
    #[error("missing question text")]
    MissingPrompt,
    #[error("options must be an array of 4 strings, got {0}")]
    OptionCount(usize),
    #[error("correct answer must be between 0 and 3, got {0}")]
    CorrectIndexOutOfRange(i64),
    #[error("missing explanation")]
    MissingExplanation,
    #[error("missing category")]
    MissingCategory,
    #[error("missing or invalid year")]
    MissingYear,
    #[error("missing season")]
    MissingSeason,
}

//
// ─── PROVENANCE ───────────────────────────────────────────────────────────────
//

/// Where a question was originally published (exam year and season).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub year: Option<u32>,
    pub season: Option<String>,
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Unvalidated question fields as they arrive from a bank file or a database row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: i64,
    pub explanation: String,
    pub category: String,
    pub difficulty: Option<String>,
    pub year: Option<i64>,
    pub season: Option<String>,
}

impl QuestionDraft {
    /// Collects every structural problem with this draft, in field order.
    #[must_use]
    pub fn problems(&self) -> Vec<QuestionError> {
        let mut problems = Vec::new();
        if self.id.trim().is_empty() {
            problems.push(QuestionError::MissingId);
        }
        if self.prompt.trim().is_empty() {
            problems.push(QuestionError::MissingPrompt);
        }
        if self.options.len() != OPTION_COUNT {
            problems.push(QuestionError::OptionCount(self.options.len()));
        }
        if !(0..OPTION_COUNT as i64).contains(&self.correct_index) {
            problems.push(QuestionError::CorrectIndexOutOfRange(self.correct_index));
        }
        if self.explanation.trim().is_empty() {
            problems.push(QuestionError::MissingExplanation);
        }
        if self.category.trim().is_empty() {
            problems.push(QuestionError::MissingCategory);
        }
        problems
    }

    /// Like [`problems`](Self::problems), but also requires a positive year and a
    /// non-empty season. Used when importing into the question store.
    #[must_use]
    pub fn import_problems(&self) -> Vec<QuestionError> {
        let mut problems = self.problems();
        if !matches!(self.year, Some(year) if year > 0 && u32::try_from(year).is_ok()) {
            problems.push(QuestionError::MissingYear);
        }
        if self.season.as_deref().is_none_or(|s| s.trim().is_empty()) {
            problems.push(QuestionError::MissingSeason);
        }
        problems
    }

    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` reported by [`problems`](Self::problems).
    pub fn validate(self) -> Result<Question, QuestionError> {
        if let Some(err) = self.problems().into_iter().next() {
            return Err(err);
        }

        let options: [String; OPTION_COUNT] = self
            .options
            .try_into()
            .map_err(|rest: Vec<String>| QuestionError::OptionCount(rest.len()))?;
        let correct_index = usize::try_from(self.correct_index)
            .map_err(|_| QuestionError::CorrectIndexOutOfRange(self.correct_index))?;

        Ok(Question {
            id: QuestionId::new(self.id.trim()),
            prompt: self.prompt,
            options,
            correct_index,
            explanation: self.explanation,
            category: self.category,
            difficulty: normalize_optional(self.difficulty),
            provenance: Provenance {
                year: self.year.and_then(|y| u32::try_from(y).ok()),
                season: normalize_optional(self.season),
            },
        })
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: String,
    category: String,
    difficulty: Option<String>,
    provenance: Provenance,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Returns the option text at `index`, if it exists.
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Convert back into a draft, e.g. for persisting to a row.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            id: self.id.as_str().to_string(),
            prompt: self.prompt.clone(),
            options: self.options.to_vec(),
            correct_index: self.correct_index as i64,
            explanation: self.explanation.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            year: self.provenance.year.map(i64::from),
            season: self.provenance.season.clone(),
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
