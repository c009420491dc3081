// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        mock_test::{MockTestRequest, TestDefinition},
        submission::{RecordedAnswer, Submission},
    },
    store::{ExamStore, ScoreFn},
};

#[derive(Default)]
struct Inner {
    tests: BTreeMap<i64, TestDefinition>,
    submissions: HashMap<(i64, i64), Submission>,
    next_test_id: i64,
    next_submission_id: i64,
}

impl Inner {
    fn submission_entry(&mut self, test_id: i64, student_id: i64) -> &mut Submission {
        let next_id = &mut self.next_submission_id;
        self.submissions
            .entry((test_id, student_id))
            .or_insert_with(|| {
                *next_id += 1;
                tracing::debug!(test_id, student_id, "Creating submission");
                Submission::new(*next_id, test_id, student_id, Utc::now())
            })
    }
}

/// Process-local store. Used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryExamStore {
    inner: RwLock<Inner>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn list_tests(&self) -> Result<Vec<TestDefinition>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.tests.values().rev().cloned().collect())
    }

    async fn get_test(&self, test_id: i64) -> Result<Option<TestDefinition>, AppError> {
        Ok(self.inner.read().await.tests.get(&test_id).cloned())
    }

    async fn create_test(&self, request: MockTestRequest) -> Result<TestDefinition, AppError> {
        let mut inner = self.inner.write().await;
        inner.next_test_id += 1;
        let now = Utc::now();
        let definition = TestDefinition {
            id: inner.next_test_id,
            title: request.title,
            description: request.description,
            sections: request.sections,
            created_at: Some(now),
            updated_at: Some(now),
        };
        inner.tests.insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn replace_test(
        &self,
        test_id: i64,
        request: MockTestRequest,
    ) -> Result<Option<TestDefinition>, AppError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.tests.get_mut(&test_id) else {
            return Ok(None);
        };
        existing.title = request.title;
        existing.description = request.description;
        existing.sections = request.sections;
        existing.updated_at = Some(Utc::now());
        Ok(Some(existing.clone()))
    }

    async fn get_or_create_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Submission, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.submission_entry(test_id, student_id).clone())
    }

    async fn get_submission(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.submissions.get(&(test_id, student_id)).cloned())
    }

    async fn upsert_answer(
        &self,
        test_id: i64,
        student_id: i64,
        answer: RecordedAnswer,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let submission = inner.submission_entry(test_id, student_id);
        if submission.is_finished() {
            return Err(AppError::Conflict("Submission is already finished".to_string()));
        }
        submission.upsert_answer(answer);
        Ok(())
    }

    async fn finalize(
        &self,
        test_id: i64,
        student_id: i64,
        score: &ScoreFn<'_>,
    ) -> Result<Submission, AppError> {
        let mut inner = self.inner.write().await;
        let submission = inner
            .submissions
            .get_mut(&(test_id, student_id))
            .ok_or_else(|| AppError::NotFound("No submission for this test".to_string()))?;

        let scores = score(&*submission);
        submission.section_scores = scores.section_scores;
        submission.total_correct = scores.total_correct;
        submission.total_questions = scores.total_questions;
        submission.finished_at.get_or_insert_with(Utc::now);

        Ok(submission.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{
        mock_test::{SectionName, fixtures::*},
        submission::FinalScores,
    };

    fn no_scores(_: &Submission) -> FinalScores {
        FinalScores {
            section_scores: Vec::new(),
            total_correct: 0,
            total_questions: 0,
        }
    }

    fn answer(choice: &str) -> RecordedAnswer {
        RecordedAnswer {
            section: SectionName::Reading,
            number: 1,
            choice: choice.to_string(),
            correct: choice == "A",
        }
    }

    fn request() -> MockTestRequest {
        MockTestRequest {
            title: "Mock".to_string(),
            description: String::new(),
            sections: vec![section(SectionName::Reading, 5, vec![mcq(1, "A")])],
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryExamStore::new();
        let first = store.get_or_create_submission(1, 7).await.unwrap();
        store.upsert_answer(1, 7, answer("A")).await.unwrap();
        let second = store.get_or_create_submission(1, 7).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.started_at, second.started_at);
        assert_eq!(second.answers.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_start_creates_one_submission() {
        let store = Arc::new(MemoryExamStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.get_or_create_submission(3, 9).await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_get_submission_reports_absence() {
        let store = MemoryExamStore::new();
        assert!(store.get_submission(1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finalize_keeps_first_finish_time() {
        let store = MemoryExamStore::new();
        store.get_or_create_submission(1, 7).await.unwrap();

        let first = store.finalize(1, 7, &no_scores).await.unwrap();
        let second = store.finalize(1, 7, &no_scores).await.unwrap();
        assert!(first.finished_at.is_some());
        assert_eq!(first.finished_at, second.finished_at);
    }

    #[tokio::test]
    async fn test_finalize_without_submission_is_not_found() {
        let store = MemoryExamStore::new();
        let err = store.finalize(1, 7, &no_scores).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_finished_submission_rejects_answers() {
        let store = MemoryExamStore::new();
        store.upsert_answer(1, 7, answer("B")).await.unwrap();
        store.finalize(1, 7, &no_scores).await.unwrap();

        let err = store.upsert_answer(1, 7, answer("A")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let sub = store.get_submission(1, 7).await.unwrap().unwrap();
        assert_eq!(sub.answers[0].choice, "B");
        assert!(!sub.answers[0].correct);
    }

    #[tokio::test]
    async fn test_finalize_scores_the_stored_answers() {
        let store = MemoryExamStore::new();
        store.upsert_answer(1, 7, answer("A")).await.unwrap();

        let finished = store
            .finalize(1, 7, &|sub: &Submission| FinalScores {
                section_scores: Vec::new(),
                total_correct: sub.answers.iter().filter(|a| a.correct).count() as i64,
                total_questions: 1,
            })
            .await
            .unwrap();
        assert_eq!(finished.total_correct, 1);
    }

    #[tokio::test]
    async fn test_create_and_replace_test() {
        let store = MemoryExamStore::new();
        let created = store.create_test(request()).await.unwrap();
        assert_eq!(created.id, 1);

        let mut changed = request();
        changed.title = "Renamed".to_string();
        let replaced = store.replace_test(created.id, changed).await.unwrap().unwrap();
        assert_eq!(replaced.title, "Renamed");
        assert!(store.replace_test(99, request()).await.unwrap().is_none());
        assert_eq!(store.list_tests().await.unwrap().len(), 1);
    }
}
