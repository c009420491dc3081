// src/engine/session.rs

//! The four student-facing operations: start, record answer, finish, review.
//! Each one is a short unit of work against an [`ExamStore`].

use crate::{
    engine::{
        grading::{grade, normalize_choice},
        review::build_review,
        scoring::compute_final_scores,
    },
    error::AppError,
    models::{
        mock_test::{SectionName, TestDefinition},
        review::{ReviewOrder, ReviewPayload},
        submission::{
            FinishResponse, RecordAnswerResponse, RecordedAnswer, Submission, SubmissionStatus,
            SubmissionSummary,
        },
    },
    store::ExamStore,
};

pub async fn load_test(store: &dyn ExamStore, test_id: i64) -> Result<TestDefinition, AppError> {
    store
        .get_test(test_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Mock test not found".to_string()))
}

/// Starts the test, or resumes the existing attempt unchanged.
pub async fn start(
    store: &dyn ExamStore,
    test_id: i64,
    student_id: i64,
) -> Result<SubmissionSummary, AppError> {
    load_test(store, test_id).await?;
    let submission = store.get_or_create_submission(test_id, student_id).await?;
    Ok(submission.summary())
}

pub async fn status(
    store: &dyn ExamStore,
    test_id: i64,
    student_id: i64,
) -> Result<SubmissionStatus, AppError> {
    load_test(store, test_id).await?;
    let submission = store.get_submission(test_id, student_id).await?;
    Ok(SubmissionStatus {
        started: submission.is_some(),
        submission: submission.map(|s| s.summary()),
    })
}

/// Records (or overwrites) one answer and reports its correctness right away.
/// A finished submission is frozen, so late answers fail with `Conflict`.
pub async fn record_answer(
    store: &dyn ExamStore,
    test_id: i64,
    student_id: i64,
    section: &str,
    number: i32,
    choice: &str,
) -> Result<RecordAnswerResponse, AppError> {
    let definition = load_test(store, test_id).await?;

    let section = section.parse::<SectionName>().map_err(AppError::BadRequest)?;
    if !definition.has_section(section) {
        return Err(AppError::BadRequest(format!(
            "Section {} is not part of this test",
            section
        )));
    }
    let question = definition.find_question(section, number).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Question {} does not exist in section {}",
            number, section
        ))
    })?;
    if normalize_choice(choice).is_empty() {
        return Err(AppError::BadRequest("Choice is required".to_string()));
    }

    let graded = grade(question, choice);
    store
        .upsert_answer(
            test_id,
            student_id,
            RecordedAnswer {
                section,
                number,
                choice: choice.trim().to_string(),
                correct: graded.is_correct(),
            },
        )
        .await?;

    Ok(RecordAnswerResponse {
        accepted: true,
        correct: graded.is_correct(),
        graded: graded.is_graded(),
    })
}

/// Recomputes and persists the aggregate scores. Safe to repeat.
pub async fn finish(
    store: &dyn ExamStore,
    test_id: i64,
    student_id: i64,
) -> Result<FinishResponse, AppError> {
    let definition = load_test(store, test_id).await?;
    let submission = store
        .finalize(test_id, student_id, &|submission: &Submission| {
            compute_final_scores(&definition, submission)
        })
        .await?;
    let finished_at = submission.finished_at.ok_or_else(|| {
        AppError::InternalServerError("Finalized submission has no finish time".to_string())
    })?;

    tracing::info!(
        test_id,
        student_id,
        total_correct = submission.total_correct,
        total_questions = submission.total_questions,
        "Submission finished"
    );

    Ok(FinishResponse {
        section_scores: submission.section_scores,
        total_correct: submission.total_correct,
        total_questions: submission.total_questions,
        finished_at,
    })
}

pub async fn review(
    store: &dyn ExamStore,
    test_id: i64,
    student_id: i64,
    order: ReviewOrder,
) -> Result<ReviewPayload, AppError> {
    let definition = load_test(store, test_id).await?;
    let submission = store
        .get_submission(test_id, student_id)
        .await?
        .ok_or_else(|| AppError::NotReady("No finished submission".to_string()))?;

    build_review(&definition, &submission, order)
}
