//! The `examscore score-all` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio_util::sync::CancellationToken;

use examscore_core::engine::ProgressReporter;
use examscore_core::report::BulkReport;
use examscore_core::scoring::ScoreRecord;
use examscore_core::ScoringError;

use super::{open_store, service};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_submission_start(&self, submission_id: &str) {
        eprintln!("  Scoring: {submission_id}");
    }

    fn on_submission_scored(&self, submission_id: &str, record: &ScoreRecord) {
        let review = if record.needs_manual_review {
            " (manual review pending)"
        } else {
            ""
        };
        eprintln!(
            "  Done: {submission_id} band {:.1}{review}",
            record.overall_band_score
        );
    }

    fn on_submission_error(&self, submission_id: &str, error: &ScoringError) {
        eprintln!("  ERROR: {submission_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {succeeded}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, store) = open_store(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let output = output.unwrap_or(config.output_dir);

    tracing::info!(parallelism, data_dir = %config.data_dir.display(), "starting bulk scoring");
    let service = service(store, parallelism);

    // Ctrl-C stops scheduling; in-flight submissions still finish.
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, finishing in-flight submissions...");
                cancel.cancel();
            }
        }
    });

    let result = service.score_all(&cancel, &ConsoleReporter).await;
    watcher.abort();
    let report = result?;

    print_summary(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("bulk-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Report saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &BulkReport) {
    let mut table = Table::new();
    table.set_header(vec!["Submission", "Status", "Band", "Detail"]);

    for outcome in &report.outcomes {
        let (status, band, detail) = match (&outcome.record, &outcome.error) {
            (Some(record), _) => (
                "scored",
                format!("{:.1}", record.overall_band_score),
                if record.needs_manual_review {
                    "manual review pending".to_string()
                } else {
                    String::new()
                },
            ),
            (None, Some(error)) => ("error", "-".to_string(), error.message.clone()),
            (None, None) => ("error", "-".to_string(), String::new()),
        };
        table.add_row(vec![
            Cell::new(&outcome.submission_id),
            Cell::new(status),
            Cell::new(band),
            Cell::new(detail),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Scored: {}  Failed: {}  Not attempted: {}",
        report.succeeded, report.failed, report.not_attempted
    );
}
