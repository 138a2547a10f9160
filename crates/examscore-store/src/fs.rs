//! JSON data-directory store.
//!
//! Layout under the root:
//!
//! ```text
//! exams/<exam_id>.toml | exams/<exam_id>.json
//! submissions/<submission_id>.json
//! ```
//!
//! Score writes go to a temporary file that is renamed over the existing one,
//! so a submission file is never left half-written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use examscore_core::error::Entity;
use examscore_core::model::{Exam, Submission};
use examscore_core::parser::{parse_exam_json_str, parse_exam_str};
use examscore_core::scoring::ScoreRecord;
use examscore_core::traits::{ExamStore, SubmissionStore};
use examscore_core::CorruptRecord;

use crate::error::StoreError;

const EXAMS_DIR: &str = "exams";
const SUBMISSIONS_DIR: &str = "submissions";

/// Store backed by a data directory of exam and submission files.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

fn check_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exams_dir(&self) -> PathBuf {
        self.root.join(EXAMS_DIR)
    }

    pub fn submissions_dir(&self) -> PathBuf {
        self.root.join(SUBMISSIONS_DIR)
    }

    fn submission_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        check_id(id)?;
        Ok(self.submissions_dir().join(format!("{id}.json")))
    }

    /// Save an exam as `exams/<id>.json`.
    pub async fn save_exam(&self, exam: &Exam) -> Result<()> {
        check_id(&exam.id)?;
        let path = self.exams_dir().join(format!("{}.json", exam.id));
        let json = serde_json::to_string_pretty(exam).context("failed to serialize exam")?;
        write_atomic(&path, json.as_bytes()).await
    }

    /// Save a submission as `submissions/<id>.json`, replacing any existing file.
    pub async fn save_submission(&self, submission: &Submission) -> Result<()> {
        let path = self.submission_path(&submission.id)?;
        let json =
            serde_json::to_string_pretty(submission).context("failed to serialize submission")?;
        write_atomic(&path, json.as_bytes()).await
    }

    async fn read_submission(&self, path: &Path) -> Result<Submission> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read submission: {}", path.display()))?;
        let submission = serde_json::from_str(&content)
            .map_err(|e| corrupt(Entity::Submission, path, e.to_string()))?;
        Ok(submission)
    }

    /// All readable submissions in file name order, and the files that
    /// failed to decode.
    async fn all_submissions(&self) -> Result<(Vec<Submission>, Vec<CorruptRecord>)> {
        let dir = self.submissions_dir();
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to read directory: {}", dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut submissions = Vec::with_capacity(paths.len());
        let mut unreadable = Vec::new();
        for path in paths {
            match self.read_submission(&path).await {
                Ok(submission) => submissions.push(submission),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                    if let Ok(record) = e.downcast::<CorruptRecord>() {
                        unreadable.push(record);
                    }
                }
            }
        }
        Ok((submissions, unreadable))
    }
}

/// A decode failure for the file at `path`, named by its file stem.
fn corrupt(entity: Entity, path: &Path, reason: String) -> CorruptRecord {
    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    CorruptRecord {
        entity,
        id,
        location: path.display().to_string(),
        reason,
    }
}

/// Write `contents` to a sibling temp file, then rename it into place.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to move {} into place", path.display()))?;
    Ok(())
}

#[async_trait]
impl ExamStore for DirectoryStore {
    async fn exam(&self, exam_id: &str) -> Result<Option<Exam>> {
        check_id(exam_id)?;
        let dir = self.exams_dir();

        let toml_path = dir.join(format!("{exam_id}.toml"));
        if tokio::fs::try_exists(&toml_path).await.unwrap_or(false) {
            let content = tokio::fs::read_to_string(&toml_path)
                .await
                .with_context(|| format!("failed to read exam file: {}", toml_path.display()))?;
            let exam = parse_exam_str(&content, &toml_path)
                .map_err(|e| corrupt(Entity::Exam, &toml_path, format!("{e:#}")))?;
            return Ok(Some(exam));
        }

        let json_path = dir.join(format!("{exam_id}.json"));
        if tokio::fs::try_exists(&json_path).await.unwrap_or(false) {
            let content = tokio::fs::read_to_string(&json_path)
                .await
                .with_context(|| format!("failed to read exam file: {}", json_path.display()))?;
            let exam = parse_exam_json_str(&content, &json_path)
                .map_err(|e| corrupt(Entity::Exam, &json_path, format!("{e:#}")))?;
            return Ok(Some(exam));
        }

        Ok(None)
    }
}

#[async_trait]
impl SubmissionStore for DirectoryStore {
    async fn submission(&self, submission_id: &str) -> Result<Option<Submission>> {
        let path = self.submission_path(submission_id)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        self.read_submission(&path).await.map(Some)
    }

    async fn unscored(&self) -> Result<Vec<Submission>> {
        let (mut submissions, _) = self.all_submissions().await?;
        submissions.retain(|s| !s.scored);
        Ok(submissions)
    }

    async fn unreadable(&self) -> Result<Vec<CorruptRecord>> {
        let (_, unreadable) = self.all_submissions().await?;
        Ok(unreadable)
    }

    async fn for_exam(&self, exam_id: &str) -> Result<Vec<Submission>> {
        let (mut submissions, _) = self.all_submissions().await?;
        submissions.retain(|s| s.exam_id == exam_id);
        Ok(submissions)
    }

    async fn record_score(
        &self,
        submission_id: &str,
        record: &ScoreRecord,
        scored_at: DateTime<Utc>,
    ) -> Result<()> {
        let path = self.submission_path(submission_id)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::MissingSubmission(submission_id.to_string()).into());
        }
        let mut submission = self.read_submission(&path).await?;
        submission.apply_score(record.clone(), scored_at);

        let json =
            serde_json::to_string_pretty(&submission).context("failed to serialize submission")?;
        write_atomic(&path, json.as_bytes()).await?;
        tracing::debug!(submission_id, path = %path.display(), "recorded score");
        Ok(())
    }
}
