// src/engine/grading.rs

use crate::models::mock_test::Question;

/// The single normalization rule for choices and answer keys.
/// Answer capture and final scoring both go through here.
pub fn normalize_choice(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Correct,
    Incorrect,
    /// The question type has no grading strategy.
    Ungraded,
}

impl Grade {
    pub fn is_correct(self) -> bool {
        matches!(self, Grade::Correct)
    }

    pub fn is_graded(self) -> bool {
        !matches!(self, Grade::Ungraded)
    }
}

/// Grades one choice against a question.
pub fn grade(question: &Question, choice: &str) -> Grade {
    if !question.question_type.is_graded() {
        return Grade::Ungraded;
    }
    if normalize_choice(choice) == normalize_choice(&question.answer) {
        Grade::Correct
    } else {
        Grade::Incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mock_test::{QuestionType, fixtures::mcq};

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize_choice("  b\t"), "B");
        assert_eq!(normalize_choice(""), "");
    }

    #[test]
    fn test_grade_is_case_insensitive() {
        let q = mcq(1, "B");
        assert_eq!(grade(&q, "b"), Grade::Correct);
        assert_eq!(grade(&q, " B "), Grade::Correct);
        assert_eq!(grade(&q, "C"), Grade::Incorrect);
    }

    #[test]
    fn test_stored_answer_is_normalized_too() {
        let q = mcq(1, " c ");
        assert!(grade(&q, "C").is_correct());
    }

    #[test]
    fn test_non_mcq_is_ungraded() {
        let mut q = mcq(1, "TRUE");
        q.question_type = QuestionType::TrueFalseNotGiven;
        let g = grade(&q, "true");
        assert_eq!(g, Grade::Ungraded);
        assert!(!g.is_correct());
        assert!(!g.is_graded());
    }
}
