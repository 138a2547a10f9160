//! In-memory store for tests and embedding.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use examscore_core::model::{Exam, Submission};
use examscore_core::scoring::ScoreRecord;
use examscore_core::traits::{ExamStore, SubmissionStore};

use crate::error::StoreError;

/// A store holding exams and submissions in memory.
///
/// Submissions are listed in id order.
#[derive(Default)]
pub struct MemoryStore {
    exams: RwLock<BTreeMap<String, Exam>>,
    submissions: RwLock<BTreeMap<String, Submission>>,
    /// Number of successful `record_score` writes.
    write_count: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for seeding an exam.
    pub fn with_exam(self, exam: Exam) -> Self {
        self.insert_exam(exam);
        self
    }

    /// Builder-style helper for seeding a submission.
    pub fn with_submission(self, submission: Submission) -> Self {
        self.insert_submission(submission);
        self
    }

    pub fn insert_exam(&self, exam: Exam) {
        self.exams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(exam.id.clone(), exam);
    }

    pub fn insert_submission(&self, submission: Submission) {
        self.submissions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(submission.id.clone(), submission);
    }

    /// A copy of the stored submission, if any.
    pub fn submission_snapshot(&self, id: &str) -> Option<Submission> {
        self.submissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Get the number of score writes made to this store.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn exam(&self, exam_id: &str) -> anyhow::Result<Option<Exam>> {
        Ok(self
            .exams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(exam_id)
            .cloned())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn submission(&self, submission_id: &str) -> anyhow::Result<Option<Submission>> {
        Ok(self.submission_snapshot(submission_id))
    }

    async fn unscored(&self) -> anyhow::Result<Vec<Submission>> {
        Ok(self
            .submissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| !s.scored)
            .cloned()
            .collect())
    }

    async fn for_exam(&self, exam_id: &str) -> anyhow::Result<Vec<Submission>> {
        Ok(self
            .submissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn record_score(
        &self,
        submission_id: &str,
        record: &ScoreRecord,
        scored_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut submissions = self
            .submissions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let submission = submissions
            .get_mut(submission_id)
            .ok_or_else(|| StoreError::MissingSubmission(submission_id.to_string()))?;
        submission.apply_score(record.clone(), scored_at);
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
