// src/engine/scoring.rs

use crate::{
    engine::grading::grade,
    models::{
        mock_test::TestDefinition,
        submission::{FinalScores, SectionScore, Submission},
    },
};

/// Whole percent of `correct / total`, rounded half up. Zero when `total` is zero.
///
/// Integer arithmetic keeps exact halves (e.g. 1/8 = 12.5%) from drifting.
pub fn percentage(correct: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (correct * 200 + total) / (total * 2)
}

/// Recomputes every section score from the definition and the raw answers.
///
/// The stored per-answer `correct` flags are ignored. Answers whose
/// `(section, number)` no longer exists are skipped, and question types
/// without a grading strategy count toward neither `correct` nor `total`.
pub fn compute_final_scores(definition: &TestDefinition, submission: &Submission) -> FinalScores {
    let mut section_scores = Vec::new();

    for flat in definition.flatten() {
        let mut correct = 0;
        let mut total = 0;

        for question in flat
            .questions
            .iter()
            .filter(|q| q.question_type.is_graded())
        {
            total += 1;
            if let Some(answer) = submission.answer(flat.name, question.number) {
                if grade(question, &answer.choice).is_correct() {
                    correct += 1;
                }
            }
        }

        section_scores.push(SectionScore {
            section: flat.name,
            correct,
            total,
            percentage: percentage(correct, total),
        });
    }

    let total_correct = section_scores.iter().map(|s| s.correct).sum();
    let total_questions = section_scores.iter().map(|s| s.total).sum();

    FinalScores {
        section_scores,
        total_correct,
        total_questions,
    }
}
