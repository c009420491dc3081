// src/models/review.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{
    mock_test::{ChoiceOption, QuestionType, SectionName},
    submission::SectionScore,
};

/// How review items are ordered when a test has several sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewOrder {
    /// Sort by question number only; sections sharing numbers interleave.
    ByNumber,
    /// Section order of the test first, then question number.
    #[default]
    BySection,
}

impl FromStr for ReviewOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "by_number" => Ok(ReviewOrder::ByNumber),
            "section" | "by_section" => Ok(ReviewOrder::BySection),
            other => Err(format!("Unknown review order '{}'", other)),
        }
    }
}

/// Display data of the group a reviewed question belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupMeta {
    pub title: String,
    pub instructions: String,
    pub passage_html: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub part: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewItem {
    pub section: SectionName,
    pub number: i32,
    /// None when the question was removed from the test after answering.
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub prompt: String,
    pub options: Vec<ChoiceOption>,
    pub correct_answer: String,
    /// Empty when the question was never answered.
    pub chosen: String,
    /// As stored when the answer was recorded.
    pub correct: bool,
    pub explanation_html: Option<String>,
    pub group: Option<GroupMeta>,
    /// The answer points at a question that no longer exists.
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewPayload {
    pub test_id: i64,
    pub title: String,
    pub items: Vec<ReviewItem>,
    pub section_scores: Vec<SectionScore>,
    pub total_correct: i64,
    pub total_questions: i64,
    pub finished_at: DateTime<Utc>,
}
