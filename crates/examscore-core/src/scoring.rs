//! Submission scoring orchestrator.
//!
//! Drives per-question scoring, section aggregation, and the overall band
//! for one submission. Pure: persisting the record is the caller's job
//! (see [`crate::engine::ScoringService`]).

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, SectionScore, SectionStatus};
use crate::error::ScoringError;
use crate::model::{Exam, QuestionDefinition, Section, Submission};
use crate::scorer::{score_question, QuestionResult};

/// The full scoring result embedded in a scored submission.
///
/// Holds no timestamps, so scoring the same inputs twice serializes to the
/// same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub exam_id: String,
    /// Per-section scores, in order of first appearance in the exam.
    pub sections: Vec<SectionScore>,
    /// One result per exam question, in ordinal order.
    pub question_results: Vec<QuestionResult>,
    /// Mean band of auto-scored sections, rounded to one decimal.
    pub overall_band_score: f64,
    /// Correct objective answers.
    pub total_correct: u32,
    /// Objective questions.
    pub total_questions: u32,
    pub points_earned: u32,
    pub max_points: u32,
    /// `total_correct / total_questions` as a whole percentage.
    pub percentage: u32,
    /// Any question still awaits manual review.
    pub needs_manual_review: bool,
}

impl ScoreRecord {
    pub fn section(&self, section: Section) -> Option<&SectionScore> {
        self.sections.iter().find(|s| s.section == section)
    }

    /// Returns `true` if no section could be auto-scored.
    pub fn is_wholly_manual(&self) -> bool {
        self.sections
            .iter()
            .all(|s| s.status == SectionStatus::ManualReview)
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the auto-scored sections' bands, or 0.0 if there are none.
pub fn overall_band(sections: &[SectionScore]) -> f64 {
    let bands: Vec<u8> = sections.iter().filter_map(|s| s.band_score).collect();
    if bands.is_empty() {
        return 0.0;
    }
    let sum: u32 = bands.iter().map(|&b| u32::from(b)).sum();
    round_to_tenth(sum as f64 / bands.len() as f64)
}

fn declared_sections(exam: &Exam) -> Result<Vec<Section>, ScoringError> {
    exam.sections
        .iter()
        .map(|name| {
            name.parse().map_err(|_| ScoringError::MalformedSection {
                section: name.clone(),
                reason: format!("exam {} declares an unrecognized section", exam.id),
            })
        })
        .collect()
}

/// Score a submission against its exam.
///
/// Fails when the submission was taken against a different exam, when the
/// exam is empty, or when the exam itself is malformed.
pub fn score_submission(submission: &Submission, exam: &Exam) -> Result<ScoreRecord, ScoringError> {
    if submission.exam_id != exam.id {
        return Err(ScoringError::ReferenceMismatch {
            submission_id: submission.id.clone(),
            expected: submission.exam_id.clone(),
            found: exam.id.clone(),
        });
    }
    if exam.questions.is_empty() {
        return Err(ScoringError::EmptyExam {
            exam_id: exam.id.clone(),
        });
    }

    // Stable sort: questions sharing a number keep their definition order.
    let mut ordered: Vec<&QuestionDefinition> = exam.questions.iter().collect();
    ordered.sort_by_key(|q| q.number);

    let question_results = ordered
        .iter()
        .map(|q| score_question(q, submission.answer_for(q)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: Vec<(Section, Vec<QuestionResult>)> = Vec::new();
    for result in &question_results {
        match groups.iter_mut().find(|(section, _)| *section == result.section) {
            Some((_, group)) => group.push(result.clone()),
            None => groups.push((result.section, vec![result.clone()])),
        }
    }

    for declared in declared_sections(exam)? {
        if !groups.iter().any(|(section, _)| *section == declared) {
            return Err(ScoringError::MalformedSection {
                section: declared.to_string(),
                reason: format!("exam {} declares the section but has no questions in it", exam.id),
            });
        }
    }

    let sections = groups
        .iter()
        .map(|(section, results)| aggregate(*section, results))
        .collect::<Result<Vec<_>, _>>()?;

    let total = |field: fn(&SectionScore) -> u32| {
        sections.iter().map(field).fold(0u32, u32::saturating_add)
    };
    let total_correct = total(|s| s.correct_answers);
    let total_questions = total(|s| s.total_questions);
    let points_earned = total(|s| s.points_earned);
    let max_points = total(|s| s.max_points);
    let percentage = if total_questions == 0 {
        0
    } else {
        (f64::from(total_correct) / f64::from(total_questions) * 100.0).round() as u32
    };
    let needs_manual_review = question_results.iter().any(|r| r.needs_manual_review);
    let overall_band_score = overall_band(&sections);

    tracing::debug!(
        submission_id = %submission.id,
        exam_id = %exam.id,
        questions = question_results.len(),
        sections = sections.len(),
        overall_band_score,
        "scored submission"
    );

    Ok(ScoreRecord {
        exam_id: exam.id.clone(),
        sections,
        question_results,
        overall_band_score,
        total_correct,
        total_questions,
        points_earned,
        max_points,
        percentage,
        needs_manual_review,
    })
}
