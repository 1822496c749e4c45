//! Terminal front end for the question loop.

use std::io::Write;

use quiz_core::model::{
    AttemptError, AttemptState, OPTION_COUNT, Question, QuestionAttempt, UserProgress,
};
use services::{ProgressServiceError, QuizError, QuizService};
use tokio::io::{AsyncBufRead, Lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Select(usize),
    Submit,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | "s" | "submit" => Input::Submit,
        "q" | "quit" | "exit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Input::Select(n - 1),
            _ => Input::Unknown,
        },
    }
}

fn render_question<W: Write>(out: &mut W, question: &Question) -> std::io::Result<()> {
    writeln!(out)?;
    match question.difficulty() {
        Some(difficulty) => writeln!(
            out,
            "Question {} [{} / {}]",
            question.id(),
            question.category(),
            difficulty
        )?,
        None => writeln!(out, "Question {} [{}]", question.id(), question.category())?,
    }
    writeln!(out, "{}", question.prompt())?;
    for (index, option) in question.options().iter().enumerate() {
        writeln!(out, "  {}) {}", index + 1, option)?;
    }
    Ok(())
}

fn render_outcome<W: Write>(out: &mut W, attempt: &QuestionAttempt) -> std::io::Result<()> {
    let question = attempt.question();
    if let AttemptState::Revealed { is_correct, .. } = attempt.state() {
        if is_correct {
            writeln!(out, "Correct!")?;
        } else {
            let answer = question.correct_index();
            writeln!(
                out,
                "Incorrect. The answer is {}) {}",
                answer + 1,
                question.option(answer).unwrap_or_default()
            )?;
        }
    }
    writeln!(out, "{}", question.explanation())
}

fn render_progress<W: Write>(out: &mut W, progress: &UserProgress) -> std::io::Result<()> {
    writeln!(
        out,
        "Progress: {}/{} correct ({}%)",
        progress.correct_answers(),
        progress.total_answers(),
        progress.accuracy()
    )
}

/// Run questions until the user quits or input ends.
///
/// # Errors
///
/// Returns an error if progress cannot be read or the terminal fails. A failed
/// save is reported to the user and the loop continues.
pub async fn run_quiz<R, W>(
    quiz: &QuizService,
    input: &mut Lines<R>,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        let mut attempt = match quiz.next_question().await {
            Ok(attempt) => attempt,
            Err(QuizError::NoQuestionsAvailable) => {
                writeln!(out, "No questions available. Import a question bank first.")?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        render_question(out, attempt.question())?;

        while !attempt.is_revealed() {
            write!(out, "Choose 1-4, Enter to submit, q to quit: ")?;
            out.flush()?;
            let Some(line) = input.next_line().await? else {
                return Ok(());
            };

            match parse_input(&line) {
                Input::Quit => return Ok(()),
                Input::Unknown => writeln!(out, "Type an option number, Enter, or q.")?,
                Input::Select(choice) => match attempt.select(choice) {
                    Ok(()) => writeln!(out, "Selected {}", choice + 1)?,
                    Err(AttemptError::ChoiceOutOfRange(_)) => {
                        writeln!(out, "Choose a number between 1 and {OPTION_COUNT}.")?;
                    }
                    Err(err) => writeln!(out, "{err}")?,
                },
                Input::Submit => match quiz.submit(&mut attempt).await {
                    Ok(result) => {
                        render_outcome(out, &attempt)?;
                        render_progress(out, &result.progress)?;
                    }
                    Err(QuizError::Attempt(err)) => writeln!(out, "{err}")?,
                    Err(QuizError::Progress(ProgressServiceError::Write(err))) => {
                        tracing::warn!(error = %err, "answer not saved");
                        render_outcome(out, &attempt)?;
                        writeln!(out, "Warning: your progress could not be saved ({err}).")?;
                    }
                    Err(err) => return Err(err.into()),
                },
            }
        }

        write!(out, "Enter for the next question, q to quit: ")?;
        out.flush()?;
        match input.next_line().await? {
            None => return Ok(()),
            Some(line) if parse_input(&line) == Input::Quit => return Ok(()),
            Some(_) => {}
        }
    }
}
