//! Bulk scoring report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScoringError;
use crate::scoring::ScoreRecord;

/// Whether one submission was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Why a submission failed to score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable code from [`ScoringError::kind`].
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&ScoringError> for ErrorDetail {
    fn from(error: &ScoringError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: format!("{error:#}"),
            retryable: error.is_retryable(),
        }
    }
}

/// The outcome for one attempted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub submission_id: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ScoreRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl SubmissionOutcome {
    pub fn success(submission_id: impl Into<String>, record: ScoreRecord) -> Self {
        Self {
            submission_id: submission_id.into(),
            status: OutcomeStatus::Success,
            record: Some(record),
            error: None,
        }
    }

    pub fn failure(submission_id: impl Into<String>, error: &ScoringError) -> Self {
        Self {
            submission_id: submission_id.into(),
            status: OutcomeStatus::Error,
            record: None,
            error: Some(ErrorDetail::from(error)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// A complete bulk scoring report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// One entry per attempted submission, in listing order.
    pub outcomes: Vec<SubmissionOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    /// Unscored submissions left unscheduled because of cancellation.
    pub not_attempted: usize,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BulkReport {
    pub fn new(outcomes: Vec<SubmissionOutcome>, not_attempted: usize, duration_ms: u64) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            outcomes,
            succeeded,
            failed,
            not_attempted,
            duration_ms,
        }
    }

    /// Returns true if any attempted submission failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &SubmissionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BulkReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Entity;

    fn record() -> ScoreRecord {
        ScoreRecord {
            exam_id: "e1".into(),
            sections: vec![],
            question_results: vec![],
            overall_band_score: 6.5,
            total_correct: 0,
            total_questions: 0,
            points_earned: 0,
            max_points: 0,
            percentage: 0,
            needs_manual_review: false,
        }
    }

    #[test]
    fn counts_follow_outcomes() {
        let missing = ScoringError::not_found(Entity::Exam, "gone");
        let report = BulkReport::new(
            vec![
                SubmissionOutcome::success("s1", record()),
                SubmissionOutcome::failure("s2", &missing),
                SubmissionOutcome::success("s3", record()),
            ],
            2,
            10,
        );
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.not_attempted, 2);
        assert!(report.has_failures());

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.submission_id, "s2");
        let detail = failure.error.as_ref().unwrap();
        assert_eq!(detail.kind, "not_found");
        assert!(!detail.retryable);
    }

    #[test]
    fn json_roundtrip() {
        let report = BulkReport::new(vec![SubmissionOutcome::success("s1", record())], 0, 3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = BulkReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.outcomes, report.outcomes);
    }

    #[test]
    fn failure_serializes_without_record() {
        let err = ScoringError::EmptyExam {
            exam_id: "e1".into(),
        };
        let json = serde_json::to_value(SubmissionOutcome::failure("s1", &err)).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("record").is_none());
        assert_eq!(json["error"]["kind"], "empty_exam");
    }
}
