//! Per-question scoring.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::{AnswerKey, QuestionDefinition, Section, SubmittedAnswer};
use crate::registry::{self, QuestionType};

/// The outcome of scoring a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub question_number: u32,
    pub question_type: QuestionType,
    pub section: Section,
    /// The answer as received; `None` when the question was left out.
    pub submitted: Option<SubmittedAnswer>,
    /// The answer key used; `None` for subjective questions.
    pub correct_answer: Option<AnswerKey>,
    /// Correctness; `None` for subjective questions.
    pub is_correct: Option<bool>,
    pub points: u32,
    pub max_points: u32,
    pub needs_manual_review: bool,
    pub feedback: String,
}

impl QuestionResult {
    /// Returns `true` if this result counts toward objective totals.
    pub fn is_objective(&self) -> bool {
        !self.needs_manual_review
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct == Some(true)
    }
}

/// Parse a question's section name against the closed section set.
pub fn parse_section(question: &QuestionDefinition) -> Result<Section, ScoringError> {
    question
        .section
        .parse()
        .map_err(|_| ScoringError::MalformedSection {
            section: question.section.clone(),
            reason: format!("question {} uses an unrecognized section name", question.id),
        })
}

/// Score one question against the submitted answer, if any.
///
/// A missing answer is scored as empty: incorrect for objective types,
/// still routed to manual review for subjective ones.
pub fn score_question(
    question: &QuestionDefinition,
    submitted: Option<&SubmittedAnswer>,
) -> Result<QuestionResult, ScoringError> {
    let rule = registry::resolve(question)?;
    let section = parse_section(question)?;

    let mut result = QuestionResult {
        question_id: question.id.clone(),
        question_number: question.number,
        question_type: rule.question_type,
        section,
        submitted: submitted.cloned(),
        correct_answer: None,
        is_correct: None,
        points: 0,
        max_points: question.points,
        needs_manual_review: false,
        feedback: String::new(),
    };

    let Some(matcher) = rule.matcher else {
        result.needs_manual_review = true;
        result.feedback = "Awaiting manual review by an instructor.".into();
        return Ok(result);
    };

    let key = question
        .answer_key(rule.question_type)
        .ok_or_else(|| ScoringError::MissingAnswerKey {
            question_id: question.id.clone(),
        })?;

    let correct = submitted.is_some_and(|answer| !answer.is_blank() && matcher(answer, &key));

    result.is_correct = Some(correct);
    if correct {
        result.points = question.points;
        result.feedback = "Correct".into();
    } else if submitted.map_or(true, SubmittedAnswer::is_blank) {
        result.feedback = format!("No answer given. Expected: {key}");
    } else {
        result.feedback = format!("Incorrect. Expected: {key}");
    }
    result.correct_answer = Some(key);

    Ok(result)
}
