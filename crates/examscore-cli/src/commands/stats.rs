//! The `examscore stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examscore_core::statistics::{compute_exam_stats, ExamStats};
use examscore_core::traits::SubmissionStore;

use super::open_store;

pub async fn execute(exam_id: String, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let (_, store) = open_store(config_path.as_deref())?;
    let submissions = store.for_exam(&exam_id).await?;
    let stats = compute_exam_stats(&exam_id, &submissions);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        "text" => print_stats(&stats),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }
    Ok(())
}

fn band(value: Option<f64>) -> String {
    value.map(|b| format!("{b:.1}")).unwrap_or_else(|| "-".into())
}

fn print_stats(stats: &ExamStats) {
    println!(
        "Exam {}: {} scored submissions, {} awaiting manual review",
        stats.exam_id, stats.submissions, stats.awaiting_manual_review
    );
    if stats.submissions == 0 {
        return;
    }
    println!("Mean overall band: {}", band(stats.mean_overall_band));

    let mut sections = Table::new();
    sections.set_header(vec!["Section", "Auto-scored", "Mean band"]);
    for s in &stats.sections {
        sections.add_row(vec![
            Cell::new(s.section),
            Cell::new(s.auto_scored),
            Cell::new(band(s.mean_band)),
        ]);
    }
    println!("{sections}");

    let mut questions = Table::new();
    questions.set_header(vec!["#", "Question", "Attempts", "Correct", "Rate"]);
    for q in &stats.questions {
        questions.add_row(vec![
            Cell::new(q.number),
            Cell::new(&q.question_id),
            Cell::new(q.attempts),
            Cell::new(q.correct),
            Cell::new(format!("{:.0}%", q.correct_rate * 100.0)),
        ]);
    }
    println!("{questions}");
}
