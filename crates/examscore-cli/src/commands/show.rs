//! The `examscore show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examscore_core::aggregate::SectionStatus;
use examscore_core::scoring::ScoreRecord;

use super::{open_store, service};

pub async fn execute(submission_id: String, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let (config, store) = open_store(config_path.as_deref())?;
    let service = service(store, config.parallelism);

    let Some(record) = service.score_record(&submission_id).await? else {
        println!("Submission {submission_id} has not been scored yet.");
        return Ok(());
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&record)?),
        "text" => print_record(&submission_id, &record),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }
    Ok(())
}

/// Print a section table and totals for a score record.
pub(crate) fn print_record(submission_id: &str, record: &ScoreRecord) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Status", "Correct", "Points", "Band"]);

    for section in &record.sections {
        let (status, correct, points, band) = match section.status {
            SectionStatus::AutoScored => (
                "auto-scored",
                format!("{}/{}", section.correct_answers, section.total_questions),
                format!("{}/{}", section.points_earned, section.max_points),
                section
                    .band_score
                    .map(|b| b.to_string())
                    .unwrap_or_default(),
            ),
            SectionStatus::ManualReview => (
                "manual review",
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ),
        };
        table.add_row(vec![
            Cell::new(section.section),
            Cell::new(status),
            Cell::new(correct),
            Cell::new(points),
            Cell::new(band),
        ]);
    }

    println!("Submission {submission_id} (exam {})", record.exam_id);
    println!("{table}");
    println!(
        "Overall band: {:.1}  Correct: {}/{} ({}%)",
        record.overall_band_score, record.total_correct, record.total_questions, record.percentage
    );

    let pending: Vec<String> = record
        .question_results
        .iter()
        .filter(|r| r.needs_manual_review)
        .map(|r| r.question_number.to_string())
        .collect();
    if !pending.is_empty() {
        println!("Awaiting manual review: questions {}", pending.join(", "));
    }
}
