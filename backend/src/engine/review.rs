// src/engine/review.rs

use std::collections::HashSet;

use crate::{
    error::AppError,
    models::{
        mock_test::{LocatedQuestion, SectionName, TestDefinition},
        review::{GroupMeta, ReviewItem, ReviewOrder, ReviewPayload},
        submission::{RecordedAnswer, Submission},
    },
};

/// Joins a finished submission back onto the test definition.
///
/// Every question of the test gets an item (unanswered ones carry an empty
/// choice), followed by placeholder items for answers whose question was
/// removed. Correctness comes from the stored per-answer flag, and the
/// aggregate scores are the ones persisted at finish time.
pub fn build_review(
    definition: &TestDefinition,
    submission: &Submission,
    order: ReviewOrder,
) -> Result<ReviewPayload, AppError> {
    let finished_at = submission
        .finished_at
        .ok_or_else(|| AppError::NotReady("No finished submission".to_string()))?;

    let mut items: Vec<ReviewItem> = Vec::new();
    let mut known: HashSet<(SectionName, i32)> = HashSet::new();

    for located in definition.located_questions() {
        let key = (located.section.name, located.question.number);
        if !known.insert(key) {
            continue;
        }
        items.push(question_item(located, submission.answer(key.0, key.1)));
    }

    for answer in &submission.answers {
        if !known.contains(&(answer.section, answer.number)) {
            items.push(removed_item(answer));
        }
    }

    let section_rank = definition.section_names();
    match order {
        ReviewOrder::ByNumber => items.sort_by_key(|item| item.number),
        ReviewOrder::BySection => items.sort_by_key(|item| {
            let rank = section_rank
                .iter()
                .position(|name| *name == item.section)
                .unwrap_or(section_rank.len());
            (rank, item.number)
        }),
    }

    Ok(ReviewPayload {
        test_id: definition.id,
        title: definition.title.clone(),
        items,
        section_scores: submission.section_scores.clone(),
        total_correct: submission.total_correct,
        total_questions: submission.total_questions,
        finished_at,
    })
}

fn question_item(located: LocatedQuestion<'_>, answer: Option<&RecordedAnswer>) -> ReviewItem {
    let LocatedQuestion {
        section,
        group,
        question,
    } = located;

    ReviewItem {
        section: section.name,
        number: question.number,
        question_type: Some(question.question_type),
        prompt: question.prompt.clone(),
        options: question.options.clone(),
        correct_answer: question.answer.clone(),
        chosen: answer.map(|a| a.choice.clone()).unwrap_or_default(),
        correct: answer.is_some_and(|a| a.correct),
        explanation_html: question.explanation_html.clone(),
        group: Some(GroupMeta {
            title: group.title.clone(),
            instructions: group.instructions.clone(),
            passage_html: group.passage_html.clone(),
            image_url: group.image_url.clone(),
            audio_url: group.audio_url.clone(),
            part: section.part,
        }),
        removed: false,
    }
}

fn removed_item(answer: &RecordedAnswer) -> ReviewItem {
    ReviewItem {
        section: answer.section,
        number: answer.number,
        question_type: None,
        prompt: String::new(),
        options: Vec::new(),
        correct_answer: String::new(),
        chosen: answer.choice.clone(),
        correct: answer.correct,
        explanation_html: None,
        group: None,
        removed: true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::mock_test::fixtures::*;

    fn finished(mut sub: Submission) -> Submission {
        sub.finished_at = Some(Utc::now());
        sub
    }

    fn record(
        sub: &mut Submission,
        section: SectionName,
        number: i32,
        choice: &str,
        correct: bool,
    ) {
        sub.upsert_answer(RecordedAnswer {
            section,
            number,
            choice: choice.to_string(),
            correct,
        });
    }

    #[test]
    fn test_unfinished_submission_is_not_ready() {
        let def = definition(vec![section(SectionName::Reading, 5, vec![mcq(1, "A")])]);
        let sub = Submission::new(1, 1, 7, Utc::now());

        let err = build_review(&def, &sub, ReviewOrder::BySection).unwrap_err();
        assert!(matches!(err, AppError::NotReady(_)));
    }

    #[test]
    fn test_unanswered_question_has_empty_choice() {
        let def =
            definition(vec![section(SectionName::Reading, 5, vec![mcq(1, "A"), mcq(2, "B")])]);
        let mut sub = Submission::new(1, 1, 7, Utc::now());
        record(&mut sub, SectionName::Reading, 1, "A", true);

        let review = build_review(&def, &finished(sub), ReviewOrder::BySection).unwrap();
        assert_eq!(review.items.len(), 2);
        let second = &review.items[1];
        assert_eq!(second.number, 2);
        assert_eq!(second.chosen, "");
        assert!(!second.correct);
        assert!(!second.removed);
        assert_eq!(second.correct_answer, "B");
    }

    #[test]
    fn test_removed_question_is_flagged() {
        let def = definition(vec![section(SectionName::Reading, 5, vec![mcq(1, "A")])]);
        let mut sub = Submission::new(1, 1, 7, Utc::now());
        record(&mut sub, SectionName::Reading, 1, "A", true);
        record(&mut sub, SectionName::Reading, 7, "C", true);

        let review = build_review(&def, &finished(sub), ReviewOrder::BySection).unwrap();
        assert_eq!(review.items.len(), 2);
        let stale = &review.items[1];
        assert!(stale.removed);
        assert_eq!(stale.number, 7);
        assert_eq!(stale.chosen, "C");
        assert!(stale.group.is_none());
    }

    #[test]
    fn test_correct_flag_is_read_from_storage() {
        let def = definition(vec![section(SectionName::Reading, 5, vec![mcq(1, "A")])]);
        let mut sub = Submission::new(1, 1, 7, Utc::now());
        // Stored flag disagrees with the definition (answer key edited later).
        record(&mut sub, SectionName::Reading, 1, "B", true);

        let review = build_review(&def, &finished(sub), ReviewOrder::BySection).unwrap();
        assert!(review.items[0].correct);
    }

    #[test]
    fn test_group_metadata_and_scores_are_carried() {
        let mut reading = section(SectionName::Reading, 7, vec![mcq(1, "A")]);
        reading.groups[0].passage_html = Some("<p>Memo</p>".to_string());
        reading.groups[0].image_url = Some("https://cdn.test/memo.png".to_string());
        let def = definition(vec![reading]);
        let mut sub = Submission::new(1, 1, 7, Utc::now());
        sub.total_correct = 1;
        sub.total_questions = 1;

        let review = build_review(&def, &finished(sub), ReviewOrder::BySection).unwrap();
        let group = review.items[0].group.as_ref().unwrap();
        assert_eq!(group.part, 7);
        assert_eq!(group.passage_html.as_deref(), Some("<p>Memo</p>"));
        assert_eq!(group.image_url.as_deref(), Some("https://cdn.test/memo.png"));
        assert_eq!(review.total_correct, 1);
        assert_eq!(review.total_questions, 1);
        assert_eq!(review.items[0].explanation_html.as_deref(), Some("<p>Because A</p>"));
    }

    #[test]
    fn test_ordering_policies() {
        let def = definition(vec![
            section(SectionName::Listening, 1, vec![mcq(1, "A"), mcq(2, "A")]),
            section(SectionName::Reading, 5, vec![mcq(1, "B"), mcq(2, "B")]),
        ]);
        let sub = finished(Submission::new(1, 1, 7, Utc::now()));

        let by_section: Vec<(SectionName, i32)> = build_review(&def, &sub, ReviewOrder::BySection)
            .unwrap()
            .items
            .iter()
            .map(|i| (i.section, i.number))
            .collect();
        assert_eq!(
            by_section,
            vec![
                (SectionName::Listening, 1),
                (SectionName::Listening, 2),
                (SectionName::Reading, 1),
                (SectionName::Reading, 2),
            ]
        );

        let by_number: Vec<(SectionName, i32)> = build_review(&def, &sub, ReviewOrder::ByNumber)
            .unwrap()
            .items
            .iter()
            .map(|i| (i.section, i.number))
            .collect();
        assert_eq!(
            by_number,
            vec![
                (SectionName::Listening, 1),
                (SectionName::Reading, 1),
                (SectionName::Listening, 2),
                (SectionName::Reading, 2),
            ]
        );
    }

    #[test]
    fn test_answer_to_dropped_section_sorts_last() {
        let def = definition(vec![section(SectionName::Reading, 5, vec![mcq(3, "A")])]);
        let mut sub = Submission::new(1, 1, 7, Utc::now());
        record(&mut sub, SectionName::Listening, 1, "A", false);

        let review = build_review(&def, &finished(sub), ReviewOrder::BySection).unwrap();
        assert_eq!(review.items[0].section, SectionName::Reading);
        assert_eq!(review.items[1].section, SectionName::Listening);
        assert!(review.items[1].removed);
    }
}
