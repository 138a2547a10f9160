//! Scoring service tests against real store implementations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use examscore_core::engine::{NoopReporter, ProgressReporter, ScoringConfig, ScoringService};
use examscore_core::model::{AnswerKey, Exam, QuestionDefinition, Submission, SubmittedAnswer};
use examscore_core::report::OutcomeStatus;
use examscore_core::scoring::ScoreRecord;
use examscore_core::traits::{ExamStore, SubmissionStore};
use examscore_core::ScoringError;
use examscore_store::{DirectoryStore, MemoryStore};

fn exam(id: &str) -> Exam {
    Exam {
        id: id.into(),
        title: String::new(),
        sections: vec![],
        questions: vec![
            QuestionDefinition {
                id: "q1".into(),
                number: 1,
                question_type: "mcq_single".into(),
                section: "Reading".into(),
                points: 1,
                correct_answer: Some(AnswerKey::Token("A".into())),
                options: vec![],
                text: String::new(),
            },
            QuestionDefinition {
                id: "q2".into(),
                number: 2,
                question_type: "writing_task2".into(),
                section: "Writing".into(),
                points: 1,
                correct_answer: None,
                options: vec![],
                text: String::new(),
            },
        ],
    }
}

fn submission(id: &str, exam_id: &str) -> Submission {
    Submission::new(id, exam_id, "student").with_answer("q1", SubmittedAnswer::Text("A".into()))
}

fn memory_service(store: &Arc<MemoryStore>, parallelism: usize) -> ScoringService {
    ScoringService::new(store.clone(), store.clone(), ScoringConfig { parallelism })
}

#[derive(Default)]
struct CountingReporter {
    started: AtomicUsize,
    scored: AtomicUsize,
    errors: AtomicUsize,
    batches: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn on_submission_start(&self, _: &str) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }
    fn on_submission_scored(&self, _: &str, _: &ScoreRecord) {
        self.scored.fetch_add(1, Ordering::Relaxed);
    }
    fn on_submission_error(&self, _: &str, _: &ScoringError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }
}

#[tokio::test]
async fn one_missing_exam_does_not_stop_the_others() {
    let store = Arc::new(
        MemoryStore::new()
            .with_exam(exam("e1"))
            .with_submission(submission("s1", "e1"))
            .with_submission(submission("s2", "e1"))
            .with_submission(submission("s3", "missing"))
            .with_submission(submission("s4", "e1"))
            .with_submission(submission("s5", "e1")),
    );
    let service = memory_service(&store, 2);
    let reporter = CountingReporter::default();

    let report = service
        .score_all(&CancellationToken::new(), &reporter)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 1);
    assert_eq!(report.not_attempted, 0);

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.submission_id, "s3");
    assert_eq!(failure.status, OutcomeStatus::Error);
    assert_eq!(failure.error.as_ref().unwrap().kind, "not_found");

    assert!(!store.submission_snapshot("s3").unwrap().scored);
    for id in ["s1", "s2", "s4", "s5"] {
        let stored = store.submission_snapshot(id).unwrap();
        assert!(stored.scored, "{id} not scored");
        assert_eq!(stored.score.unwrap().overall_band_score, 9.0);
    }
    assert_eq!(store.write_count(), 4);

    assert_eq!(reporter.started.load(Ordering::Relaxed), 5);
    assert_eq!(reporter.scored.load(Ordering::Relaxed), 4);
    assert_eq!(reporter.errors.load(Ordering::Relaxed), 1);
    assert_eq!(reporter.batches.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn malformed_exams_fail_alone() {
    let mut unknown_type = exam("bad-type");
    unknown_type.questions[0].question_type = "drag_drop".into();
    let mut empty_section = exam("bad-section");
    empty_section.sections = vec!["Listening".into(), "Reading".into(), "Writing".into()];

    let store = Arc::new(
        MemoryStore::new()
            .with_exam(exam("e1"))
            .with_exam(unknown_type)
            .with_exam(empty_section)
            .with_submission(submission("s1", "e1"))
            .with_submission(submission("s2", "bad-type"))
            .with_submission(submission("s3", "e1"))
            .with_submission(submission("s4", "bad-section")),
    );
    let service = memory_service(&store, 2);

    let report = service
        .score_all(&CancellationToken::new(), &NoopReporter)
        .await
        .unwrap();

    let statuses: Vec<(&str, OutcomeStatus)> = report
        .outcomes
        .iter()
        .map(|o| (o.submission_id.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("s1", OutcomeStatus::Success),
            ("s2", OutcomeStatus::Error),
            ("s3", OutcomeStatus::Success),
            ("s4", OutcomeStatus::Error),
        ]
    );

    let unknown = report.outcomes[1].error.as_ref().unwrap();
    assert_eq!(unknown.kind, "unknown_question_type");
    assert!(!unknown.retryable);
    assert!(unknown.message.contains("drag_drop"));

    let section = report.outcomes[3].error.as_ref().unwrap();
    assert_eq!(section.kind, "malformed_section");
    assert!(!section.retryable);

    assert!(store.submission_snapshot("s1").unwrap().scored);
    assert!(store.submission_snapshot("s3").unwrap().scored);
    assert!(!store.submission_snapshot("s2").unwrap().scored);
    assert!(!store.submission_snapshot("s4").unwrap().scored);
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn second_pass_has_nothing_to_do() {
    let store = Arc::new(
        MemoryStore::new()
            .with_exam(exam("e1"))
            .with_submission(submission("s1", "e1")),
    );
    let service = memory_service(&store, 4);
    let cancel = CancellationToken::new();

    assert_eq!(service.score_all(&cancel, &NoopReporter).await.unwrap().succeeded, 1);
    let again = service.score_all(&cancel, &NoopReporter).await.unwrap();
    assert!(again.outcomes.is_empty());
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn cancelled_before_start_schedules_nothing() {
    let store = Arc::new(
        MemoryStore::new()
            .with_exam(exam("e1"))
            .with_submission(submission("s1", "e1"))
            .with_submission(submission("s2", "e1"))
            .with_submission(submission("s3", "e1")),
    );
    let service = memory_service(&store, 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = service.score_all(&cancel, &NoopReporter).await.unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.not_attempted, 3);
    assert_eq!(store.write_count(), 0);
}

/// Cancels the pass as soon as the first submission starts.
struct CancelOnStart {
    cancel: CancellationToken,
    started: AtomicUsize,
}

impl ProgressReporter for CancelOnStart {
    fn on_submission_start(&self, _: &str) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.cancel.cancel();
    }
    fn on_submission_scored(&self, _: &str, _: &ScoreRecord) {}
    fn on_submission_error(&self, _: &str, _: &ScoringError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

#[tokio::test]
async fn cancel_mid_pass_finishes_in_flight_submission() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::new(dir.path()));
    store.save_exam(&exam("e1")).await.unwrap();
    let total = 6;
    for i in 0..total {
        store
            .save_submission(&submission(&format!("s{i}"), "e1"))
            .await
            .unwrap();
    }

    let service = ScoringService::new(store.clone(), store.clone(), ScoringConfig { parallelism: 2 });
    let cancel = CancellationToken::new();
    let reporter = CancelOnStart {
        cancel: cancel.clone(),
        started: AtomicUsize::new(0),
    };

    let report = service.score_all(&cancel, &reporter).await.unwrap();

    assert_eq!(reporter.started.load(Ordering::Relaxed), 1);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.not_attempted, total - 1);

    let started = &report.outcomes[0];
    assert!(started.is_success());
    let stored = store.submission(&started.submission_id).await.unwrap().unwrap();
    assert!(stored.scored);
    assert_eq!(stored.score.as_ref(), started.record.as_ref());
    assert_eq!(store.unscored().await.unwrap().len(), total - 1);
}

#[tokio::test]
async fn rescoring_overwrites_record() {
    let store = Arc::new(
        MemoryStore::new()
            .with_exam(exam("e1"))
            .with_submission(submission("s1", "e1")),
    );
    let service = memory_service(&store, 1);

    let first = service.score_one("s1").await.unwrap();
    let second = service.score_one("s1").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.write_count(), 2);
    assert_eq!(service.score_record("s1").await.unwrap(), Some(second));
}

/// Serves whatever exam it holds, regardless of the requested id.
struct WrongExamStore(Exam);

#[async_trait]
impl ExamStore for WrongExamStore {
    async fn exam(&self, _exam_id: &str) -> anyhow::Result<Option<Exam>> {
        Ok(Some(self.0.clone()))
    }
}

#[tokio::test]
async fn mismatched_exam_leaves_submission_unscored() {
    let submissions = Arc::new(MemoryStore::new().with_submission(submission("s1", "X")));
    let service = ScoringService::new(
        Arc::new(WrongExamStore(exam("Y"))),
        submissions.clone(),
        ScoringConfig::default(),
    );

    let err = service.score_one("s1").await.unwrap_err();
    assert!(matches!(err, ScoringError::ReferenceMismatch { .. }));
    assert!(!submissions.submission_snapshot("s1").unwrap().scored);
    assert_eq!(submissions.write_count(), 0);
}

/// Delegates reads to a memory store and fails every write.
struct ReadOnlyStore(MemoryStore);

#[async_trait]
impl SubmissionStore for ReadOnlyStore {
    async fn submission(&self, id: &str) -> anyhow::Result<Option<Submission>> {
        self.0.submission(id).await
    }
    async fn unscored(&self) -> anyhow::Result<Vec<Submission>> {
        self.0.unscored().await
    }
    async fn for_exam(&self, exam_id: &str) -> anyhow::Result<Vec<Submission>> {
        self.0.for_exam(exam_id).await
    }
    async fn record_score(&self, _: &str, _: &ScoreRecord, _: DateTime<Utc>) -> anyhow::Result<()> {
        anyhow::bail!("store is read-only")
    }
}

#[tokio::test]
async fn store_failures_are_retryable_outcomes() {
    let exams = Arc::new(MemoryStore::new().with_exam(exam("e1")));
    let submissions = Arc::new(ReadOnlyStore(
        MemoryStore::new().with_submission(submission("s1", "e1")),
    ));
    let service = ScoringService::new(exams, submissions.clone(), ScoringConfig::default());

    let report = service
        .score_all(&CancellationToken::new(), &NoopReporter)
        .await
        .unwrap();
    let detail = report.outcomes[0].error.as_ref().unwrap();
    assert_eq!(detail.kind, "store");
    assert!(detail.retryable);
    assert!(detail.message.contains("read-only"));
    assert!(!submissions.0.submission_snapshot("s1").unwrap().scored);
}

#[tokio::test]
async fn directory_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::new(dir.path()));
    store.save_exam(&exam("e1")).await.unwrap();
    for i in 0..8 {
        store
            .save_submission(&submission(&format!("s{i}"), "e1"))
            .await
            .unwrap();
    }
    store.save_submission(&submission("orphan", "gone")).await.unwrap();

    let service = ScoringService::new(store.clone(), store.clone(), ScoringConfig { parallelism: 3 });
    let report = service
        .score_all(&CancellationToken::new(), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 9);
    assert_eq!(report.succeeded, 8);
    assert_eq!(report.failed, 1);

    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.submission_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let remaining = store.unscored().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "orphan");

    let path = dir.path().join("report.json");
    report.save_json(&path).unwrap();
    let loaded = examscore_core::report::BulkReport::load_json(&path).unwrap();
    assert_eq!(loaded.outcomes, report.outcomes);
}

#[tokio::test]
async fn corrupt_exam_file_is_not_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::new(dir.path()));
    store.save_exam(&exam("e1")).await.unwrap();
    std::fs::write(store.exams_dir().join("broken.json"), "{ not json").unwrap();
    store.save_submission(&submission("s1", "e1")).await.unwrap();
    store.save_submission(&submission("s2", "broken")).await.unwrap();
    store.save_submission(&submission("s3", "e1")).await.unwrap();

    let service = ScoringService::new(store.clone(), store.clone(), ScoringConfig::default());
    let report = service
        .score_all(&CancellationToken::new(), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.submission_id, "s2");
    let detail = failure.error.as_ref().unwrap();
    assert_eq!(detail.kind, "corrupt_record");
    assert!(!detail.retryable);
    assert!(detail.message.contains("broken.json"));
}

#[tokio::test]
async fn corrupt_submission_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::new(dir.path()));
    store.save_exam(&exam("e1")).await.unwrap();
    store.save_submission(&submission("s1", "e1")).await.unwrap();
    store.save_submission(&submission("s2", "e1")).await.unwrap();
    std::fs::write(store.submissions_dir().join("garbled.json"), "{ nope").unwrap();

    let reporter = CountingReporter::default();
    let service = ScoringService::new(store.clone(), store.clone(), ScoringConfig::default());
    let report = service
        .score_all(&CancellationToken::new(), &reporter)
        .await
        .unwrap();

    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.submission_id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "garbled"]);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.not_attempted, 0);

    let detail = report.outcomes[2].error.as_ref().unwrap();
    assert_eq!(detail.kind, "corrupt_record");
    assert!(!detail.retryable);
    assert_eq!(reporter.started.load(Ordering::Relaxed), 2);
    assert_eq!(reporter.errors.load(Ordering::Relaxed), 1);
}
