//! Scoring service and bulk coordinator.
//!
//! Resolves submissions and exams through the collaborator stores, scores
//! them, and persists the result. Bulk passes run submissions concurrently
//! behind a semaphore and isolate per-submission failures.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::{Entity, ScoringError};
use crate::model::Submission;
use crate::report::{BulkReport, SubmissionOutcome};
use crate::scoring::{score_submission, ScoreRecord};
use crate::traits::{ExamStore, SubmissionStore};

/// Configuration for the scoring service.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Maximum submissions scored concurrently in a bulk pass.
    pub parallelism: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Progress reporting trait for bulk passes.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_start(&self, submission_id: &str);
    fn on_submission_scored(&self, submission_id: &str, record: &ScoreRecord);
    fn on_submission_error(&self, submission_id: &str, error: &ScoringError);
    fn on_batch_complete(&self, total: usize, succeeded: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_start(&self, _: &str) {}
    fn on_submission_scored(&self, _: &str, _: &ScoreRecord) {}
    fn on_submission_error(&self, _: &str, _: &ScoringError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The scoring service.
pub struct ScoringService {
    exams: Arc<dyn ExamStore>,
    submissions: Arc<dyn SubmissionStore>,
    config: ScoringConfig,
}

impl ScoringService {
    pub fn new(
        exams: Arc<dyn ExamStore>,
        submissions: Arc<dyn SubmissionStore>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            exams,
            submissions,
            config,
        }
    }

    /// Score one submission by id and persist the record.
    ///
    /// Scoring an already-scored submission overwrites its record.
    pub async fn score_one(&self, submission_id: &str) -> Result<ScoreRecord, ScoringError> {
        let submission = self
            .submissions
            .submission(submission_id)
            .await?
            .ok_or_else(|| ScoringError::not_found(Entity::Submission, submission_id))?;
        score_and_persist(self.exams.as_ref(), self.submissions.as_ref(), &submission).await
    }

    /// The stored score record of a submission; `None` while unscored.
    pub async fn score_record(&self, submission_id: &str) -> Result<Option<ScoreRecord>, ScoringError> {
        let submission = self
            .submissions
            .submission(submission_id)
            .await?
            .ok_or_else(|| ScoringError::not_found(Entity::Submission, submission_id))?;
        Ok(submission.score)
    }

    /// Score every unscored submission.
    ///
    /// Per-submission failures become error outcomes. Once `cancel` fires,
    /// no new submission starts; those already running finish and report.
    /// Submissions the store reports as unreadable become error outcomes
    /// after the scored ones. Only a failure to list is returned as `Err`.
    pub async fn score_all(
        &self,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<BulkReport, ScoringError> {
        let start = Instant::now();
        let pending = self.submissions.unscored().await?;
        let unreadable = self.submissions.unreadable().await?;
        let total = pending.len() + unreadable.len();
        tracing::info!("found {} unscored submissions", pending.len());

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let exams = self.exams.as_ref();
        let submissions = self.submissions.as_ref();

        let mut futures = FuturesUnordered::new();
        for (index, submission) in pending.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, submission.id, None);
                };
                if cancel.is_cancelled() {
                    return (index, submission.id, None);
                }
                progress.on_submission_start(&submission.id);
                let result = score_and_persist(exams, submissions, &submission).await;
                (index, submission.id, Some(result))
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut not_attempted = 0usize;

        while let Some((index, submission_id, result)) = futures.next().await {
            match result {
                None => not_attempted += 1,
                Some(Ok(record)) => {
                    progress.on_submission_scored(&submission_id, &record);
                    outcomes.push((index, SubmissionOutcome::success(submission_id, record)));
                }
                Some(Err(e)) => {
                    tracing::error!(submission_id = %submission_id, kind = e.kind(), "scoring failed: {e:#}");
                    progress.on_submission_error(&submission_id, &e);
                    outcomes.push((index, SubmissionOutcome::failure(submission_id, &e)));
                }
            }
        }

        outcomes.sort_by_key(|(index, _)| *index);
        let mut outcomes: Vec<SubmissionOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

        // Corrupt records were never listed, so they follow the scored ones.
        for corrupt in unreadable {
            let submission_id = corrupt.id.clone();
            let e = ScoringError::Store(corrupt.into());
            tracing::error!(submission_id = %submission_id, kind = e.kind(), "submission unreadable: {e}");
            progress.on_submission_error(&submission_id, &e);
            outcomes.push(SubmissionOutcome::failure(submission_id, &e));
        }

        let elapsed = start.elapsed();
        let report = BulkReport::new(outcomes, not_attempted, elapsed.as_millis() as u64);
        progress.on_batch_complete(total, report.succeeded, report.failed, elapsed);

        if not_attempted > 0 {
            tracing::warn!("bulk scoring cancelled, {not_attempted} submissions not attempted");
        }

        Ok(report)
    }
}

/// Resolve the exam, score, and persist. Nothing is written on failure.
async fn score_and_persist(
    exams: &dyn ExamStore,
    submissions: &dyn SubmissionStore,
    submission: &Submission,
) -> Result<ScoreRecord, ScoringError> {
    let exam = exams
        .exam(&submission.exam_id)
        .await?
        .ok_or_else(|| ScoringError::not_found(Entity::Exam, &submission.exam_id))?;

    let record = score_submission(submission, &exam)?;
    submissions
        .record_score(&submission.id, &record, Utc::now())
        .await?;

    tracing::info!(
        submission_id = %submission.id,
        student_id = %submission.student_id,
        "scoring completed, band {:.1}",
        record.overall_band_score
    );
    Ok(record)
}
