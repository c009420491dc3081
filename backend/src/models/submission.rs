// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::mock_test::SectionName;

/// One stored answer. `(section, number)` is the key; at most one per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordedAnswer {
    pub section: SectionName,
    pub number: i32,
    pub choice: String,
    /// Correctness computed when the answer was written.
    pub correct: bool,
}

/// Per-section result computed at finish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SectionScore {
    pub section: SectionName,
    pub correct: i64,
    pub total: i64,
    /// Whole percent, rounded half up.
    pub percentage: i64,
}

/// A student's attempt at one mock test.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    pub id: i64,
    pub test_id: i64,
    pub student_id: i64,
    /// First-answer order is preserved; overwrites keep their position.
    pub answers: Vec<RecordedAnswer>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub section_scores: Vec<SectionScore>,
    pub total_correct: i64,
    pub total_questions: i64,
}

impl Submission {
    pub fn new(id: i64, test_id: i64, student_id: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            test_id,
            student_id,
            answers: Vec::new(),
            started_at,
            finished_at: None,
            section_scores: Vec::new(),
            total_correct: 0,
            total_questions: 0,
        }
    }

    pub fn answer(&self, section: SectionName, number: i32) -> Option<&RecordedAnswer> {
        self.answers
            .iter()
            .find(|a| a.section == section && a.number == number)
    }

    /// Last write wins.
    pub fn upsert_answer(&mut self, answer: RecordedAnswer) {
        match self
            .answers
            .iter_mut()
            .find(|a| a.section == answer.section && a.number == answer.number)
        {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn summary(&self) -> SubmissionSummary {
        SubmissionSummary {
            id: self.id,
            test_id: self.test_id,
            student_id: self.student_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            answered_count: self.answers.len(),
            total_correct: self.total_correct,
            total_questions: self.total_questions,
        }
    }
}

/// Returned by start/resume.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionSummary {
    pub id: i64,
    pub test_id: i64,
    pub student_id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub answered_count: usize,
    pub total_correct: i64,
    pub total_questions: i64,
}

/// "Not started" is a normal answer here, not an error.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionStatus {
    pub started: bool,
    pub submission: Option<SubmissionSummary>,
}

/// DTO for recording (autosaving) one answer.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordAnswerRequest {
    #[validate(length(min = 1, max = 50, message = "Section is required"))]
    pub section: String,
    pub number: i32,
    #[validate(length(min = 1, max = 200, message = "Choice is required"))]
    pub choice: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordAnswerResponse {
    pub accepted: bool,
    pub correct: bool,
    /// False for question types without a grading strategy.
    pub graded: bool,
}

/// Output of the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FinalScores {
    pub section_scores: Vec<SectionScore>,
    pub total_correct: i64,
    pub total_questions: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FinishResponse {
    pub section_scores: Vec<SectionScore>,
    pub total_correct: i64,
    pub total_questions: i64,
    pub finished_at: DateTime<Utc>,
}
