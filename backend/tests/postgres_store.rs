// tests/postgres_store.rs
//
// Needs a running Postgres. Run with:
//   DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored

use sqlx::postgres::PgPoolOptions;
use toeic_backend::{
    engine::session,
    error::AppError,
    models::{
        mock_test::{
            ChoiceOption, MockTestRequest, Question, QuestionGroup, QuestionType, Section,
            SectionName,
        },
        review::ReviewOrder,
    },
    store::{ExamStore, PgExamStore},
};

async fn store() -> PgExamStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    PgExamStore::new(pool)
}

fn reading_test() -> MockTestRequest {
    let question = |number: i32, answer: &str| Question {
        number,
        question_type: QuestionType::MultipleChoice,
        prompt: format!("Question {}", number),
        options: ["A", "B", "C", "D"]
            .iter()
            .map(|k| ChoiceOption {
                key: k.to_string(),
                text: k.to_lowercase(),
            })
            .collect(),
        answer: answer.to_string(),
        explanation_html: None,
    };

    MockTestRequest {
        title: "Postgres mock".to_string(),
        description: String::new(),
        sections: vec![Section {
            name: SectionName::Reading,
            part: 5,
            duration_minutes: 75,
            linear: false,
            groups: vec![QuestionGroup {
                questions: vec![question(1, "B"), question(2, "C")],
                ..Default::default()
            }],
        }],
    }
}

/// Unique per run so repeated runs against one database do not collide.
fn student_id() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_full_flow() {
    let store = store().await;
    let test = store.create_test(reading_test()).await.unwrap();
    let student = student_id();

    session::start(&store, test.id, student).await.unwrap();
    let first = session::record_answer(&store, test.id, student, "reading", 1, "b").await.unwrap();
    assert!(first.correct);
    session::record_answer(&store, test.id, student, "Reading", 2, "A").await.unwrap();
    session::record_answer(&store, test.id, student, "Reading", 2, "C").await.unwrap();

    let finish = session::finish(&store, test.id, student).await.unwrap();
    assert_eq!(finish.total_correct, 2);
    assert_eq!(finish.total_questions, 2);

    let again = session::finish(&store, test.id, student).await.unwrap();
    assert_eq!(again.finished_at, finish.finished_at);

    let late = session::record_answer(&store, test.id, student, "Reading", 1, "A").await;
    assert!(matches!(late, Err(AppError::Conflict(_))));

    let review = session::review(&store, test.id, student, ReviewOrder::BySection).await.unwrap();
    assert_eq!(review.items.len(), 2);
    assert_eq!(review.items[0].chosen, "b");
    assert_eq!(review.items[1].chosen, "C");
    assert_eq!(review.total_correct, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_concurrent_start_creates_one_submission() {
    let store = std::sync::Arc::new(store().await);
    let test = store.create_test(reading_test()).await.unwrap();
    let student = student_id();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let test_id = test.id;
        handles.push(tokio::spawn(async move {
            store.get_or_create_submission(test_id, student).await.unwrap().id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}
