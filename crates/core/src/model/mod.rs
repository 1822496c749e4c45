mod attempt;
mod ids;
mod progress;
mod question;

pub use ids::{ParseIdError, QuestionId};

pub use attempt::{AnswerSubmission, AttemptError, AttemptState, QuestionAttempt};
pub use progress::{ProgressError, RecordOutcome, UserProgress, accuracy_percent};
pub use question::{OPTION_COUNT, Provenance, Question, QuestionDraft, QuestionError};
