//! Scoring error types.
//!
//! Every error here is scoped to a single submission. The bulk coordinator
//! catches them per item; `score_one` hands them straight to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Exam,
    Submission,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Exam => write!(f, "exam"),
            Entity::Submission => write!(f, "submission"),
        }
    }
}

/// A stored exam or submission that exists but cannot be decoded.
///
/// Stores return this through `anyhow`; [`ScoringError::is_retryable`]
/// looks for it in the error chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("corrupt {entity} record {id} at {location}: {reason}")]
pub struct CorruptRecord {
    pub entity: Entity,
    pub id: String,
    pub location: String,
    pub reason: String,
}

/// Errors that can occur while scoring a submission.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The exam references a type tag outside the registry.
    #[error("question {question_id} has unknown type '{tag}'")]
    UnknownQuestionType { question_id: String, tag: String },

    /// A section name is unrecognized, or a section has no questions.
    #[error("malformed section '{section}': {reason}")]
    MalformedSection { section: String, reason: String },

    /// The fetched exam is not the one the submission was taken against.
    #[error("submission {submission_id} references exam {expected} but exam {found} was provided")]
    ReferenceMismatch {
        submission_id: String,
        expected: String,
        found: String,
    },

    /// The exam has no questions.
    #[error("exam {exam_id} has no questions")]
    EmptyExam { exam_id: String },

    /// The referenced submission or exam does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// An objective question carries no answer key.
    #[error("question {question_id} is objective but has no answer key")]
    MissingAnswerKey { question_id: String },

    /// A collaborator store failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ScoringError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        ScoringError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable snake_case code for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::UnknownQuestionType { .. } => "unknown_question_type",
            ScoringError::MalformedSection { .. } => "malformed_section",
            ScoringError::ReferenceMismatch { .. } => "reference_mismatch",
            ScoringError::EmptyExam { .. } => "empty_exam",
            ScoringError::NotFound { .. } => "not_found",
            ScoringError::MissingAnswerKey { .. } => "missing_answer_key",
            ScoringError::Store(_) if self.corrupt_record().is_some() => "corrupt_record",
            ScoringError::Store(_) => "store",
        }
    }

    /// The corrupt record behind a store failure, if that is what it was.
    pub fn corrupt_record(&self) -> Option<&CorruptRecord> {
        match self {
            ScoringError::Store(e) => e.chain().find_map(|c| c.downcast_ref::<CorruptRecord>()),
            _ => None,
        }
    }

    /// Returns `true` if a later attempt with the same inputs could succeed.
    ///
    /// Only collaborator failures qualify, and not when the stored record
    /// itself is corrupt. Malformed exams and missing records fail the same
    /// way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScoringError::Store(_)) && self.corrupt_record().is_none()
    }
}
