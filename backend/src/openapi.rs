// src/openapi.rs

use utoipa::OpenApi;

use crate::{
    handlers::{mock_test, session},
    models::{
        mock_test::{
            ChoiceOption, MockTestRequest, MockTestSummary, PublicGroup, PublicMockTest,
            PublicQuestion, PublicSection, Question, QuestionGroup, QuestionType, Section,
            SectionName, SectionSummary, TestDefinition,
        },
        review::{GroupMeta, ReviewItem, ReviewPayload},
        submission::{
            FinishResponse, RecordAnswerRequest, RecordAnswerResponse, SectionScore,
            SubmissionStatus, SubmissionSummary,
        },
    },
};

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "TOEIC mock test API"),
    paths(
        mock_test::list_mock_tests,
        mock_test::get_mock_test,
        mock_test::admin_get_mock_test,
        mock_test::create_mock_test,
        mock_test::replace_mock_test,
        session::start_test,
        session::get_submission,
        session::record_answer,
        session::finish_test,
        session::review_test,
    ),
    components(schemas(
        SectionName,
        QuestionType,
        ChoiceOption,
        Question,
        QuestionGroup,
        Section,
        TestDefinition,
        MockTestRequest,
        MockTestSummary,
        SectionSummary,
        PublicMockTest,
        PublicSection,
        PublicGroup,
        PublicQuestion,
        SectionScore,
        SubmissionSummary,
        SubmissionStatus,
        RecordAnswerRequest,
        RecordAnswerResponse,
        FinishResponse,
        GroupMeta,
        ReviewItem,
        ReviewPayload,
    ))
)]
pub struct ApiDoc;
