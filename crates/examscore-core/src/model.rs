//! Core data model types for examscore.
//!
//! These are the exam, question, and submission shapes the collaborator
//! stores hand to the scoring engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::QuestionType;
use crate::scoring::ScoreRecord;

/// Exam sections, scored as units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    Listening,
    Reading,
    Writing,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Listening => write!(f, "Listening"),
            Section::Reading => write!(f, "Reading"),
            Section::Writing => write!(f, "Writing"),
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "listening" => Ok(Section::Listening),
            "reading" => Ok(Section::Reading),
            "writing" => Ok(Section::Writing),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// The correct-answer specification of an objective question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    /// A single option id or text answer.
    Token(String),
    /// A set of option ids, or accepted spellings of a text answer.
    Tokens(Vec<String>),
    /// Item -> match pairs for matching questions.
    Pairs(BTreeMap<String, String>),
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerKey::Token(t) => write!(f, "{t}"),
            AnswerKey::Tokens(ts) => write!(f, "{}", ts.join(", ")),
            AnswerKey::Pairs(pairs) => {
                let joined: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}

/// A student's answer to one question, as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Text(String),
    Choices(Vec<String>),
    Pairs(BTreeMap<String, String>),
}

impl SubmittedAnswer {
    /// The answer as a single token, if it has exactly one.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            SubmittedAnswer::Text(t) => Some(t.as_str()),
            SubmittedAnswer::Choices(c) if c.len() == 1 => Some(c[0].as_str()),
            _ => None,
        }
    }

    /// The answer as a list of tokens. Scalars become one-element lists.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            SubmittedAnswer::Text(t) => vec![t.as_str()],
            SubmittedAnswer::Choices(c) => c.iter().map(String::as_str).collect(),
            SubmittedAnswer::Pairs(_) => Vec::new(),
        }
    }

    /// Returns `true` if nothing was actually entered.
    pub fn is_blank(&self) -> bool {
        match self {
            SubmittedAnswer::Text(t) => t.trim().is_empty(),
            SubmittedAnswer::Choices(c) => c.iter().all(|s| s.trim().is_empty()),
            SubmittedAnswer::Pairs(p) => p.is_empty(),
        }
    }
}

/// A selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// One question of an exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// Identifier, unique within the exam.
    pub id: String,
    /// Ordinal number; questions are scored in this order.
    pub number: u32,
    /// Type tag, resolved through the registry at scoring time.
    #[serde(rename = "type")]
    pub question_type: String,
    /// Owning section name.
    pub section: String,
    /// Point weight.
    #[serde(default = "default_points")]
    pub points: u32,
    /// Explicit answer key; takes precedence over `options`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<AnswerKey>,
    /// Options for choice questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AnswerOption>,
    /// Prompt text, for display only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

fn default_points() -> u32 {
    1
}

impl QuestionDefinition {
    /// Resolve the answer key for this question.
    ///
    /// Falls back to options flagged `correct` when no explicit key is set.
    pub fn answer_key(&self, kind: QuestionType) -> Option<AnswerKey> {
        if let Some(key) = &self.correct_answer {
            return Some(key.clone());
        }

        let mut flagged: Vec<String> = self
            .options
            .iter()
            .filter(|o| o.correct)
            .map(|o| o.id.clone())
            .collect();

        match (kind, flagged.len()) {
            (_, 0) => None,
            (QuestionType::McqMultiple, _) => Some(AnswerKey::Tokens(flagged)),
            (_, 1) => flagged.pop().map(AnswerKey::Token),
            (_, _) => Some(AnswerKey::Tokens(flagged)),
        }
    }
}

/// A complete exam definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Sections the exam declares; each must end up with questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
}

/// A student's exam attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub exam_id: String,
    pub student_id: String,
    /// Question id -> submitted answer.
    #[serde(default)]
    pub answers: BTreeMap<String, SubmittedAnswer>,
    #[serde(default)]
    pub time_spent_secs: u64,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scored: bool,
    #[serde(default)]
    pub scored_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<ScoreRecord>,
}

impl Submission {
    pub fn new(
        id: impl Into<String>,
        exam_id: impl Into<String>,
        student_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            exam_id: exam_id.into(),
            student_id: student_id.into(),
            answers: BTreeMap::new(),
            time_spent_secs: 0,
            submitted_at: None,
            scored: false,
            scored_at: None,
            score: None,
        }
    }

    /// Builder-style helper for attaching an answer.
    pub fn with_answer(mut self, question_id: impl Into<String>, answer: SubmittedAnswer) -> Self {
        self.answers.insert(question_id.into(), answer);
        self
    }

    /// Look up the answer for a question by id, then by its `q_<number>` key.
    pub fn answer_for(&self, question: &QuestionDefinition) -> Option<&SubmittedAnswer> {
        self.answers
            .get(&question.id)
            .or_else(|| self.answers.get(&format!("q_{}", question.number)))
    }

    /// Attach a score record and mark the submission scored.
    pub fn apply_score(&mut self, record: ScoreRecord, scored_at: DateTime<Utc>) {
        self.scored = true;
        self.scored_at = Some(scored_at);
        self.score = Some(record);
    }
}
