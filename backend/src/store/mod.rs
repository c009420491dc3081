// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        mock_test::{MockTestRequest, TestDefinition},
        submission::{FinalScores, RecordedAnswer, Submission},
    },
};

pub use memory::MemoryExamStore;
pub use postgres::PgExamStore;

/// Computes the aggregates for a submission at finish time.
pub type ScoreFn<'a> = dyn Fn(&Submission) -> FinalScores + Send + Sync + 'a;

/// Persistence for test definitions and submissions.
///
/// Submissions are keyed by `(test_id, student_id)`; at most one exists per key.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, AppError>;

    async fn get_test(&self, test_id: i64) -> Result<Option<TestDefinition>, AppError>;

    async fn create_test(&self, request: MockTestRequest) -> Result<TestDefinition, AppError>;

    /// Returns `None` when no test has this id.
    async fn replace_test(
        &self,
        test_id: i64,
        request: MockTestRequest,
    ) -> Result<Option<TestDefinition>, AppError>;

    /// Insert-if-absent, else fetch. Never creates a second record for a key,
    /// and an existing record is returned unchanged.
    async fn get_or_create_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Submission, AppError>;

    async fn get_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, AppError>;

    /// Overwrites the answer stored under `(section, number)` or appends it.
    /// Creates the submission when missing. Fails with `Conflict` once the
    /// submission is finished.
    async fn upsert_answer(
        &self,
        test_id: i64,
        student_id: i64,
        answer: RecordedAnswer,
    ) -> Result<(), AppError>;

    /// Scores the submission with `score` and writes the aggregates, with
    /// answer writes held off in between. `finished_at` is stamped on the
    /// first call only. Fails with `NotFound` when there is no submission.
    async fn finalize(
        &self,
        test_id: i64,
        student_id: i64,
        score: &ScoreFn<'_>,
    ) -> Result<Submission, AppError>;
}
