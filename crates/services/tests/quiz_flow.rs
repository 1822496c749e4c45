use std::sync::Arc;

use quiz_core::QuestionBank;
use quiz_core::model::QuestionId;
use services::{AppServices, BankSource, ProgressService, QuizError, QuizService, ServiceOptions};
use storage::PROGRESS_KEY;
use storage::bank::parse_bank;
use storage::repository::{InMemoryRepository, KeyValueStore, Storage};

const TWO_QUESTIONS: &str = r#"{
    "questions": [
        {"id": 1, "question": "Q1?", "options": ["a", "b", "c", "d"], "correctAnswer": 0,
         "explanation": "a", "category": "Strategy", "difficulty": "easy"},
        {"id": 2, "question": "Q2?", "options": ["a", "b", "c", "d"], "correctAnswer": 1,
         "explanation": "b", "category": "Technology", "difficulty": "hard"}
    ]
}"#;

fn quiz_over(repo: &InMemoryRepository, bank: QuestionBank, seed: u64) -> QuizService {
    let progress = ProgressService::new(Arc::new(repo.clone()));
    QuizService::new(Arc::new(bank), progress).with_seed(seed)
}

#[tokio::test]
async fn two_question_bank_exhausts_then_falls_back() {
    let repo = InMemoryRepository::new();
    let quiz = quiz_over(&repo, parse_bank(TWO_QUESTIONS).unwrap(), 3);
    let bank_ids = [QuestionId::new("1"), QuestionId::new("2")];

    let mut attempt = quiz.next_question().await.unwrap();
    let first = attempt.question().id().clone();
    assert!(bank_ids.contains(&first));
    attempt.select(0).unwrap();
    quiz.submit(&mut attempt).await.unwrap();

    let mut attempt = quiz.next_question().await.unwrap();
    let second = attempt.question().id().clone();
    assert_ne!(first, second, "unanswered question must be chosen first");
    attempt.select(1).unwrap();
    let result = quiz.submit(&mut attempt).await.unwrap();
    assert_eq!(result.progress.total_answers(), 2);

    for _ in 0..5 {
        let attempt = quiz.next_question().await.unwrap();
        assert!(bank_ids.contains(attempt.question().id()));
    }
    assert_eq!(quiz.stats().await.unwrap().remaining, 0);
}

#[tokio::test]
async fn repeated_answer_for_same_question_is_ignored() {
    let repo = InMemoryRepository::new();
    let quiz = quiz_over(&repo, parse_bank(TWO_QUESTIONS).unwrap(), 8);

    quiz.progress()
        .record_answer(QuestionId::new("Q1"), true)
        .await
        .unwrap();
    let after = quiz
        .progress()
        .record_answer(QuestionId::new("Q1"), false)
        .await
        .unwrap();

    assert_eq!(after.total_answers(), 1);
    assert_eq!(after.correct_answers(), 1);
}

#[tokio::test]
async fn accuracy_follows_recorded_answers() {
    let repo = InMemoryRepository::new();
    let progress = ProgressService::new(Arc::new(repo.clone()));

    progress.record_answer(QuestionId::new("a"), true).await.unwrap();
    progress.record_answer(QuestionId::new("b"), false).await.unwrap();
    let latest = progress.record_answer(QuestionId::new("c"), false).await.unwrap();

    assert_eq!(ProgressService::accuracy(&latest), 33);
    let raw = repo.get(PROGRESS_KEY).await.unwrap().unwrap();
    assert_eq!(
        raw,
        r#"{"answeredQuestions":["a","b","c"],"correctAnswers":1,"totalAnswers":3,"lastQuestionId":"c"}"#
    );
}

#[tokio::test]
async fn empty_bank_never_yields_a_question() {
    let repo = InMemoryRepository::new();
    let quiz = quiz_over(&repo, QuestionBank::default(), 1);
    assert!(matches!(
        quiz.next_question().await,
        Err(QuizError::NoQuestionsAvailable)
    ));
}

#[tokio::test]
async fn imported_questions_feed_a_sqlite_backed_quiz() {
    let storage = Storage::sqlite("sqlite:file:memdb_quiz_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");

    let importer = AppServices::from_storage(storage.clone(), ServiceOptions::default())
        .await
        .expect("empty store bootstraps");
    assert!(matches!(
        importer.quiz().next_question().await,
        Err(QuizError::NoQuestionsAvailable)
    ));

    let report = importer
        .import()
        .import_json(
            r#"[
                {"id": 10, "question": "Which is volatile memory?", "options": ["RAM", "ROM", "SSD", "HDD"],
                 "correct_answer": 0, "explanation": "RAM loses data without power.", "category": "Technology",
                 "year": 2023, "season": "spring"},
                {"id": 11, "question": "Which is not volatile?", "options": ["RAM", "SRAM", "DRAM", "ROM"],
                 "correct_answer": 3, "explanation": "ROM keeps data without power.", "category": "Technology",
                 "year": 2023, "season": "autumn"}
            ]"#,
        )
        .await
        .unwrap();
    assert!(report.success());
    assert_eq!(report.imported, 2);

    let app = AppServices::from_storage(
        storage,
        ServiceOptions {
            bank: BankSource::Store,
            seed: Some(42),
            ..ServiceOptions::default()
        },
    )
    .await
    .expect("bootstrap with imported bank");

    let quiz = app.quiz();
    assert_eq!(quiz.bank().len(), 2);

    let mut attempt = quiz.next_question().await.unwrap();
    let correct = attempt.question().correct_index();
    attempt.select(correct).unwrap();
    let result = quiz.submit(&mut attempt).await.unwrap();
    assert_eq!(result.accuracy, 100);

    let stats = quiz.stats().await.unwrap();
    assert_eq!(stats.answered, 1);
    assert_eq!(stats.remaining, 1);

    let reset = app.progress().reset().await.unwrap();
    assert!(reset.is_empty());
    assert_eq!(quiz.stats().await.unwrap().remaining, 2);
}

#[tokio::test]
async fn missing_bank_file_fails_bootstrap() {
    let result = AppServices::from_storage(
        Storage::in_memory(),
        ServiceOptions {
            bank: BankSource::File("/no/such/bank.json".into()),
            ..ServiceOptions::default()
        },
    )
    .await;
    assert!(result.is_err());
}
