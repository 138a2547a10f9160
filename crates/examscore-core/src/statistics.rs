//! Cohort statistics over the scored submissions of one exam.

use serde::{Deserialize, Serialize};

use crate::aggregate::SectionStatus;
use crate::model::{Section, Submission};

/// Per-section cohort figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStats {
    pub section: Section,
    /// Submissions in which this section was auto-scored.
    pub auto_scored: usize,
    /// Mean band over those submissions.
    pub mean_band: Option<f64>,
}

/// Per-question cohort figures, objective questions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: String,
    pub number: u32,
    /// Submissions that gave a non-blank answer.
    pub attempts: usize,
    pub correct: usize,
    /// `correct` over the number of scored submissions.
    pub correct_rate: f64,
}

/// Aggregate figures for an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamStats {
    pub exam_id: String,
    /// Scored submissions considered.
    pub submissions: usize,
    /// Scored submissions with questions still awaiting review.
    pub awaiting_manual_review: usize,
    pub mean_overall_band: Option<f64>,
    pub sections: Vec<SectionStats>,
    pub questions: Vec<QuestionStats>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Compute cohort statistics from an exam's submissions.
///
/// Unscored submissions and those scored against another exam are ignored.
pub fn compute_exam_stats(exam_id: &str, submissions: &[Submission]) -> ExamStats {
    let records: Vec<_> = submissions
        .iter()
        .filter(|s| s.exam_id == exam_id)
        .filter_map(|s| s.score.as_ref())
        .filter(|r| r.exam_id == exam_id)
        .collect();

    let awaiting_manual_review = records.iter().filter(|r| r.needs_manual_review).count();

    let overall: Vec<f64> = records
        .iter()
        .filter(|r| !r.is_wholly_manual())
        .map(|r| r.overall_band_score)
        .collect();

    let mut section_bands: Vec<(Section, Vec<f64>)> = Vec::new();
    let mut questions: Vec<QuestionStats> = Vec::new();

    for record in &records {
        for score in &record.sections {
            let idx = match section_bands.iter().position(|(s, _)| *s == score.section) {
                Some(idx) => idx,
                None => {
                    section_bands.push((score.section, Vec::new()));
                    section_bands.len() - 1
                }
            };
            if score.status == SectionStatus::AutoScored {
                if let Some(band) = score.band_score {
                    section_bands[idx].1.push(f64::from(band));
                }
            }
        }

        for result in record.question_results.iter().filter(|r| r.is_objective()) {
            let idx = match questions
                .iter()
                .position(|q| q.question_id == result.question_id)
            {
                Some(idx) => idx,
                None => {
                    questions.push(QuestionStats {
                        question_id: result.question_id.clone(),
                        number: result.question_number,
                        attempts: 0,
                        correct: 0,
                        correct_rate: 0.0,
                    });
                    questions.len() - 1
                }
            };
            let entry = &mut questions[idx];
            if result.submitted.as_ref().is_some_and(|a| !a.is_blank()) {
                entry.attempts += 1;
            }
            if result.is_correct() {
                entry.correct += 1;
            }
        }
    }

    let total = records.len();
    for q in &mut questions {
        q.correct_rate = if total == 0 {
            0.0
        } else {
            q.correct as f64 / total as f64
        };
    }
    questions.sort_by_key(|q| q.number);

    tracing::debug!(exam_id, submissions = total, "computed cohort statistics");

    ExamStats {
        exam_id: exam_id.to_string(),
        submissions: total,
        awaiting_manual_review,
        mean_overall_band: mean(&overall),
        sections: section_bands
            .into_iter()
            .map(|(section, bands)| SectionStats {
                section,
                auto_scored: bands.len(),
                mean_band: mean(&bands),
            })
            .collect(),
        questions,
    }
}
