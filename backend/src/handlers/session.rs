// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    engine::session,
    error::AppError,
    models::{
        review::ReviewPayload,
        submission::{
            FinishResponse, RecordAnswerRequest, RecordAnswerResponse, SubmissionStatus,
            SubmissionSummary,
        },
    },
    store::ExamStore,
    utils::jwt::Claims,
};

/// Starts the test for the current student, or resumes the existing attempt.
#[utoipa::path(
    post,
    path = "/api/mock-tests/{id}/start",
    params(("id" = i64, Path, description = "Mock test id")),
    responses(
        (status = 200, description = "Submission summary", body = SubmissionSummary),
        (status = 404, description = "Mock test not found")
    )
)]
pub async fn start_test(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let summary = session::start(store.as_ref(), id, student_id).await?;
    Ok(Json(summary))
}

/// Reports whether the current student has started this test.
#[utoipa::path(
    get,
    path = "/api/mock-tests/{id}/submission",
    params(("id" = i64, Path, description = "Mock test id")),
    responses(
        (status = 200, description = "Started flag and summary", body = SubmissionStatus),
        (status = 404, description = "Mock test not found")
    )
)]
pub async fn get_submission(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let status = session::status(store.as_ref(), id, student_id).await?;
    Ok(Json(status))
}

/// Autosaves one answer. Re-sending the same question overwrites it.
#[utoipa::path(
    put,
    path = "/api/mock-tests/{id}/answers",
    params(("id" = i64, Path, description = "Mock test id")),
    request_body = RecordAnswerRequest,
    responses(
        (status = 200, description = "Answer stored", body = RecordAnswerResponse),
        (status = 400, description = "Unknown section or question number"),
        (status = 404, description = "Mock test not found"),
        (status = 409, description = "Submission already finished")
    )
)]
pub async fn record_answer(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let student_id = claims.user_id()?;

    let response = session::record_answer(
        store.as_ref(),
        id,
        student_id,
        &payload.section,
        payload.number,
        &payload.choice,
    )
    .await?;

    Ok(Json(response))
}

/// Scores the submission and freezes the result. Repeating it is safe.
#[utoipa::path(
    post,
    path = "/api/mock-tests/{id}/finish",
    params(("id" = i64, Path, description = "Mock test id")),
    responses(
        (status = 200, description = "Final scores", body = FinishResponse),
        (status = 404, description = "Mock test or submission not found")
    )
)]
pub async fn finish_test(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let response = session::finish(store.as_ref(), id, student_id).await?;
    Ok(Json(response))
}

/// Chosen vs. correct answers with explanations, after finishing.
#[utoipa::path(
    get,
    path = "/api/mock-tests/{id}/review",
    params(("id" = i64, Path, description = "Mock test id")),
    responses(
        (status = 200, description = "Review payload", body = ReviewPayload),
        (status = 404, description = "Mock test not found"),
        (status = 409, description = "Test not finished yet")
    )
)]
pub async fn review_test(
    State(store): State<Arc<dyn ExamStore>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let payload = session::review(store.as_ref(), id, student_id, config.review_order).await?;
    Ok(Json(payload))
}
