//! Collaborator trait definitions.
//!
//! The scoring engine never touches storage directly. Exams and submissions
//! come from these async traits, implemented by `examscore-store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CorruptRecord;
use crate::model::{Exam, Submission};
use crate::scoring::ScoreRecord;

/// Exam lookup by id.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Fetch an exam with its ordered question list. `Ok(None)` if it does not exist.
    async fn exam(&self, exam_id: &str) -> anyhow::Result<Option<Exam>>;
}

/// Submission lookup, listing, and score persistence.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Fetch a submission. `Ok(None)` if it does not exist.
    async fn submission(&self, submission_id: &str) -> anyhow::Result<Option<Submission>>;

    /// All submissions with `scored = false`, in a stable order.
    async fn unscored(&self) -> anyhow::Result<Vec<Submission>>;

    /// Stored submissions that could not be decoded and so are missing from
    /// [`unscored`](Self::unscored). Stores that cannot hold corrupt records
    /// keep the default.
    async fn unreadable(&self) -> anyhow::Result<Vec<CorruptRecord>> {
        Ok(Vec::new())
    }

    /// All submissions taken against an exam.
    async fn for_exam(&self, exam_id: &str) -> anyhow::Result<Vec<Submission>>;

    /// Persist `scored = true`, the timestamp, and the record in one atomic write.
    async fn record_score(
        &self,
        submission_id: &str,
        record: &ScoreRecord,
        scored_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}
