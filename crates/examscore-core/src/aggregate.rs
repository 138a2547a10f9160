//! Section aggregation and band conversion.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::Section;
use crate::scorer::QuestionResult;

/// How a section was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    AutoScored,
    ManualReview,
}

/// Aggregated score for one exam section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScore {
    pub section: Section,
    pub status: SectionStatus,
    /// Objective questions in the section.
    pub total_questions: u32,
    pub correct_answers: u32,
    pub points_earned: u32,
    /// Points available over objective questions.
    pub max_points: u32,
    /// Subjective questions awaiting review.
    pub manual_review_questions: u32,
    /// Present only when `status` is `AutoScored`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_score: Option<u8>,
}

/// Band lookup table: `(lower bound of ratio, band)`, scanned top-down.
///
/// Ten equal-width bins over [0, 1]; the top bin is closed so that a
/// perfect ratio maps to 9.
pub const BAND_TABLE: [(f64, u8); 10] = [
    (0.9, 9),
    (0.8, 8),
    (0.7, 7),
    (0.6, 6),
    (0.5, 5),
    (0.4, 4),
    (0.3, 3),
    (0.2, 2),
    (0.1, 1),
    (0.0, 0),
];

/// Convert a correctness ratio to a 0-9 band.
///
/// Ratios outside [0, 1] are clamped; NaN maps to 0.
pub fn raw_to_band(ratio: f64) -> u8 {
    let ratio = if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    };
    BAND_TABLE
        .iter()
        .find(|(lower, _)| ratio >= *lower)
        .map(|(_, band)| *band)
        .unwrap_or(0)
}

/// Band for `correct` out of `total` objective questions.
pub fn band_for(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    raw_to_band(correct as f64 / total as f64)
}

/// Aggregate the results of one section.
///
/// Fails with `MalformedSection` when the section has no results at all.
pub fn aggregate(section: Section, results: &[QuestionResult]) -> Result<SectionScore, ScoringError> {
    if results.is_empty() {
        return Err(ScoringError::MalformedSection {
            section: section.to_string(),
            reason: "section has no questions".into(),
        });
    }

    let mut score = SectionScore {
        section,
        status: SectionStatus::ManualReview,
        total_questions: 0,
        correct_answers: 0,
        points_earned: 0,
        max_points: 0,
        manual_review_questions: 0,
        band_score: None,
    };

    for result in results {
        if result.needs_manual_review {
            score.manual_review_questions += 1;
            continue;
        }
        score.total_questions += 1;
        score.max_points = score.max_points.saturating_add(result.max_points);
        if result.is_correct() {
            score.correct_answers += 1;
            score.points_earned = score.points_earned.saturating_add(result.points);
        }
    }

    if score.total_questions > 0 {
        score.status = SectionStatus::AutoScored;
        score.band_score = Some(band_for(score.correct_answers, score.total_questions));
    }

    Ok(score)
}
