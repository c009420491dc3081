// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        mock_test::{MockTestRequest, Section, SectionName, TestDefinition},
        submission::{RecordedAnswer, SectionScore, Submission},
    },
    store::{ExamStore, ScoreFn},
};

/// Represents the 'mock_tests' table. Sections are stored as one JSONB document.
#[derive(FromRow)]
struct MockTestRow {
    id: i64,
    title: String,
    description: String,
    sections: Json<Vec<Section>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MockTestRow> for TestDefinition {
    fn from(row: MockTestRow) -> Self {
        TestDefinition {
            id: row.id,
            title: row.title,
            description: row.description,
            sections: row.sections.0,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

/// Represents the 'mock_submissions' table.
#[derive(FromRow)]
struct SubmissionRow {
    id: i64,
    test_id: i64,
    student_id: i64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    section_scores: Json<Vec<SectionScore>>,
    total_correct: i64,
    total_questions: i64,
}

/// Represents the 'mock_submission_answers' table.
#[derive(FromRow)]
struct AnswerRow {
    section: String,
    number: i32,
    choice: String,
    correct: bool,
}

const TEST_COLUMNS: &str = "id, title, description, sections, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "id, test_id, student_id, started_at, finished_at, \
     section_scores, total_correct, total_questions";

pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the `(test_id, student_id)` row unless it exists, then returns its id.
    /// The unique constraint turns a concurrent first start into a no-op insert.
    async fn ensure_submission(&self, test_id: i64, student_id: i64) -> Result<i64, AppError> {
        sqlx::query(
            r#"
            INSERT INTO mock_submissions (test_id, student_id)
            VALUES ($1, $2)
            ON CONFLICT (test_id, student_id) DO NOTHING
            "#,
        )
        .bind(test_id)
        .bind(student_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let (id,): (i64,) = sqlx::query_as(
            "SELECT id FROM mock_submissions WHERE test_id = $1 AND student_id = $2",
        )
        .bind(test_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch submission id: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }

    async fn load_answers<'e, E>(
        executor: E,
        submission_id: i64,
    ) -> Result<Vec<RecordedAnswer>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<AnswerRow> = sqlx::query_as(
            r#"
            SELECT section, number, choice, correct
            FROM mock_submission_answers
            WHERE submission_id = $1
            ORDER BY position
            "#,
        )
        .bind(submission_id)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch answers: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        rows.into_iter()
            .map(|row| {
                let section = row
                    .section
                    .parse::<SectionName>()
                    .map_err(AppError::InternalServerError)?;
                Ok(RecordedAnswer {
                    section,
                    number: row.number,
                    choice: row.choice,
                    correct: row.correct,
                })
            })
            .collect()
    }
}

fn hydrate(row: SubmissionRow, answers: Vec<RecordedAnswer>) -> Submission {
    Submission {
        id: row.id,
        test_id: row.test_id,
        student_id: row.student_id,
        answers,
        started_at: row.started_at,
        finished_at: row.finished_at,
        section_scores: row.section_scores.0,
        total_correct: row.total_correct,
        total_questions: row.total_questions,
    }
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, AppError> {
        let rows: Vec<MockTestRow> = sqlx::query_as(&format!(
            "SELECT {TEST_COLUMNS} FROM mock_tests ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list mock tests: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows.into_iter().map(TestDefinition::from).collect())
    }

    async fn get_test(&self, test_id: i64) -> Result<Option<TestDefinition>, AppError> {
        let row: Option<MockTestRow> = sqlx::query_as(&format!(
            "SELECT {TEST_COLUMNS} FROM mock_tests WHERE id = $1"
        ))
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch mock test: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(row.map(TestDefinition::from))
    }

    async fn create_test(&self, request: MockTestRequest) -> Result<TestDefinition, AppError> {
        let row: MockTestRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO mock_tests (title, description, sections)
            VALUES ($1, $2, $3)
            RETURNING {TEST_COLUMNS}
            "#
        ))
        .bind(&request.title)
        .bind(&request.description)
        .bind(Json(&request.sections))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create mock test: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn replace_test(
        &self,
        test_id: i64,
        request: MockTestRequest,
    ) -> Result<Option<TestDefinition>, AppError> {
        let row: Option<MockTestRow> = sqlx::query_as(&format!(
            r#"
            UPDATE mock_tests
            SET title = $2, description = $3, sections = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {TEST_COLUMNS}
            "#
        ))
        .bind(test_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(Json(&request.sections))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update mock test: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(row.map(TestDefinition::from))
    }

    async fn get_or_create_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Submission, AppError> {
        self.ensure_submission(test_id, student_id).await?;
        self.get_submission(test_id, student_id).await?.ok_or_else(|| {
            AppError::InternalServerError("Submission vanished after insert".to_string())
        })
    }

    async fn get_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM mock_submissions \
             WHERE test_id = $1 AND student_id = $2"
        ))
        .bind(test_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        match row {
            Some(row) => {
                let answers = Self::load_answers(&self.pool, row.id).await?;
                Ok(Some(hydrate(row, answers)))
            }
            None => Ok(None),
        }
    }

    async fn upsert_answer(
        &self,
        test_id: i64,
        student_id: i64,
        answer: RecordedAnswer,
    ) -> Result<(), AppError> {
        let submission_id = self.ensure_submission(test_id, student_id).await?;

        let mut tx = self.pool.begin().await?;

        // Row lock orders this write against a concurrent finalize.
        let (finished_at,): (Option<DateTime<Utc>>,) = sqlx::query_as(
            "SELECT finished_at FROM mock_submissions WHERE id = $1 FOR UPDATE",
        )
        .bind(submission_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to lock submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        if finished_at.is_some() {
            return Err(AppError::Conflict("Submission is already finished".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO mock_submission_answers (submission_id, section, number, choice, correct)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (submission_id, section, number) DO UPDATE SET
                choice = EXCLUDED.choice,
                correct = EXCLUDED.correct,
                answered_at = NOW()
            "#,
        )
        .bind(submission_id)
        .bind(answer.section.as_str())
        .bind(answer.number)
        .bind(&answer.choice)
        .bind(answer.correct)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert answer: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn finalize(
        &self,
        test_id: i64,
        student_id: i64,
        score: &ScoreFn<'_>,
    ) -> Result<Submission, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM mock_submissions \
             WHERE test_id = $1 AND student_id = $2 FOR UPDATE"
        ))
        .bind(test_id)
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to lock submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let row = row.ok_or_else(|| AppError::NotFound("No submission for this test".to_string()))?;
        let submission_id = row.id;
        let answers = Self::load_answers(&mut *tx, submission_id).await?;
        let scores = score(&hydrate(row, answers.clone()));

        let row: SubmissionRow = sqlx::query_as(&format!(
            r#"
            UPDATE mock_submissions
            SET section_scores = $2,
                total_correct = $3,
                total_questions = $4,
                finished_at = COALESCE(finished_at, NOW())
            WHERE id = $1
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(submission_id)
        .bind(Json(&scores.section_scores))
        .bind(scores.total_correct)
        .bind(scores.total_questions)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to finalize submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        tx.commit().await?;
        Ok(hydrate(row, answers))
    }
}
