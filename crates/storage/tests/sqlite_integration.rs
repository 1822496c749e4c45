use quiz_core::model::{Question, QuestionDraft, QuestionId, RecordOutcome, UserProgress};
use storage::repository::{KeyValueStore, QuestionRepository, Storage};
use storage::sqlite::SqliteRepository;
use storage::{PROGRESS_KEY, ProgressRecord};

fn build_question(id: &str, category: &str) -> Question {
    QuestionDraft {
        id: id.into(),
        prompt: format!("Question {id}"),
        options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
        correct_index: 3,
        explanation: "z is right".into(),
        category: category.into(),
        difficulty: Some("normal".into()),
        year: Some(2021),
        season: Some("spring".into()),
    }
    .validate()
    .unwrap()
}

#[tokio::test]
async fn sqlite_kv_roundtrips_progress_record() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get(PROGRESS_KEY).await.unwrap(), None);

    let progress = match UserProgress::new().record_answer(QuestionId::new("4"), false) {
        RecordOutcome::Recorded(p) => p,
        RecordOutcome::AlreadyAnswered => unreachable!(),
    };
    let encoded = ProgressRecord::from_progress(&progress).encode().unwrap();
    repo.put(PROGRESS_KEY, &encoded).await.unwrap();

    let raw = repo.get(PROGRESS_KEY).await.unwrap().expect("stored");
    assert_eq!(raw, encoded);
    let restored = ProgressRecord::decode(&raw).unwrap().into_progress().unwrap();
    assert_eq!(restored, progress);

    let reset = ProgressRecord::default().encode().unwrap();
    repo.put(PROGRESS_KEY, &reset).await.unwrap();
    assert_eq!(repo.get(PROGRESS_KEY).await.unwrap(), Some(reset));
}

#[tokio::test]
async fn sqlite_questions_upsert_in_insertion_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_questions?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.upsert_question(&build_question("20", "Strategy")).await.unwrap();
    repo.upsert_question(&build_question("3", "Technology")).await.unwrap();
    repo.upsert_question(&build_question("20", "Management")).await.unwrap();

    let listed = repo.list_questions().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|q| q.id().as_str()).collect();
    assert_eq!(ids, vec!["20", "3"]);
    assert_eq!(listed[0].category(), "Management");
    assert_eq!(listed[0].options()[3], "z");
    assert_eq!(listed[0].correct_index(), 3);
    assert_eq!(listed[0].provenance().season.as_deref(), Some("spring"));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_wires_both_ports() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.put("k", "v").await.unwrap();
    storage
        .questions
        .upsert_question(&build_question("1", "Strategy"))
        .await
        .unwrap();

    assert_eq!(storage.kv.get("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(storage.questions.list_questions().await.unwrap().len(), 1);
}
