//! Question type registry.
//!
//! A static table maps every supported type tag to its objective/subjective
//! classification and a pure correctness predicate. The scorer only ever
//! goes through this table, so adding a type means adding one row.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::{AnswerKey, QuestionDefinition, SubmittedAnswer};

/// Supported question kinds.
///
/// Variant order matches the row order of [`RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    McqSingle,
    McqMultiple,
    TrueFalseNg,
    FillGaps,
    FillGapsShort,
    SentenceCompletion,
    SummaryCompletion,
    FormCompletion,
    NoteCompletion,
    TableCompletion,
    FlowchartCompletion,
    MapLabelling,
    Matching,
    MatchingHeadings,
    MatchingFeatures,
    MatchingEndings,
    WritingTask1,
    WritingTask2,
}

/// Correctness predicate: `(submitted, key) -> correct`.
pub type Matcher = fn(&SubmittedAnswer, &AnswerKey) -> bool;

/// One registry row.
pub struct Rule {
    pub question_type: QuestionType,
    /// The tag exams use for this type.
    pub tag: &'static str,
    /// `None` for subjective types, which are never compared.
    pub matcher: Option<Matcher>,
}

impl Rule {
    pub fn is_objective(&self) -> bool {
        self.matcher.is_some()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("question_type", &self.question_type)
            .field("tag", &self.tag)
            .field("objective", &self.is_objective())
            .finish()
    }
}

const fn objective(question_type: QuestionType, tag: &'static str, matcher: Matcher) -> Rule {
    Rule {
        question_type,
        tag,
        matcher: Some(matcher),
    }
}

const fn subjective(question_type: QuestionType, tag: &'static str) -> Rule {
    Rule {
        question_type,
        tag,
        matcher: None,
    }
}

/// The registry table.
pub static RULES: [Rule; 18] = [
    objective(QuestionType::McqSingle, "mcq_single", exact_token),
    objective(QuestionType::McqMultiple, "mcq_multiple", exact_set),
    objective(QuestionType::TrueFalseNg, "true_false_ng", true_false_not_given),
    objective(QuestionType::FillGaps, "fill_gaps", normalized_text),
    objective(QuestionType::FillGapsShort, "fill_gaps_short", normalized_text),
    objective(QuestionType::SentenceCompletion, "sentence_completion", normalized_text),
    objective(QuestionType::SummaryCompletion, "summary_completion", normalized_text),
    objective(QuestionType::FormCompletion, "form_completion", normalized_text),
    objective(QuestionType::NoteCompletion, "note_completion", normalized_text),
    objective(QuestionType::TableCompletion, "table_completion", normalized_text),
    objective(QuestionType::FlowchartCompletion, "flowchart_completion", normalized_text),
    objective(QuestionType::MapLabelling, "map_labelling", normalized_text),
    objective(QuestionType::Matching, "matching", matching),
    objective(QuestionType::MatchingHeadings, "matching_headings", matching),
    objective(QuestionType::MatchingFeatures, "matching_features", matching),
    objective(QuestionType::MatchingEndings, "matching_endings", matching),
    subjective(QuestionType::WritingTask1, "writing_task1"),
    subjective(QuestionType::WritingTask2, "writing_task2"),
];

impl QuestionType {
    pub fn rule(self) -> &'static Rule {
        &RULES[self as usize]
    }

    pub fn tag(self) -> &'static str {
        self.rule().tag
    }

    pub fn is_objective(self) -> bool {
        self.rule().is_objective()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s)
            .map(|rule| rule.question_type)
            .ok_or_else(|| format!("unknown question type: {}", s.trim()))
    }
}

/// Find the rule for a type tag (case-insensitive, surrounding whitespace ignored).
pub fn lookup(tag: &str) -> Option<&'static Rule> {
    let tag = tag.trim();
    RULES.iter().find(|rule| rule.tag.eq_ignore_ascii_case(tag))
}

/// Resolve the rule for a question, failing on tags outside the registry.
pub fn resolve(question: &QuestionDefinition) -> Result<&'static Rule, ScoringError> {
    lookup(&question.question_type).ok_or_else(|| ScoringError::UnknownQuestionType {
        question_id: question.id.clone(),
        tag: question.question_type.clone(),
    })
}

// ---------------------------------------------------------------------------
// Comparison functions
// ---------------------------------------------------------------------------

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn key_tokens(key: &AnswerKey) -> Vec<&str> {
    match key {
        AnswerKey::Token(t) => vec![t.as_str()],
        AnswerKey::Tokens(ts) => ts.iter().map(String::as_str).collect(),
        AnswerKey::Pairs(_) => Vec::new(),
    }
}

/// Exact, case-sensitive match on a single option id.
pub fn exact_token(submitted: &SubmittedAnswer, key: &AnswerKey) -> bool {
    let expected = match key {
        AnswerKey::Token(t) => t.as_str(),
        AnswerKey::Tokens(ts) if ts.len() == 1 => ts[0].as_str(),
        _ => return false,
    };
    submitted.as_single() == Some(expected)
}

/// Exact set equality on option ids. Duplicate submissions never match.
pub fn exact_set(submitted: &SubmittedAnswer, key: &AnswerKey) -> bool {
    let submitted = submitted.tokens();
    let expected: BTreeSet<&str> = key_tokens(key).into_iter().collect();
    if expected.is_empty() {
        return false;
    }
    let unique: BTreeSet<&str> = submitted.iter().copied().collect();
    unique.len() == submitted.len() && unique == expected
}

/// Case-insensitive, trimmed text match. A token list key accepts any member.
pub fn normalized_text(submitted: &SubmittedAnswer, key: &AnswerKey) -> bool {
    let Some(answer) = submitted.as_single().map(normalize) else {
        return false;
    };
    if answer.is_empty() {
        return false;
    }
    key_tokens(key).into_iter().any(|k| normalize(k) == answer)
}

fn canonical_tfng(s: &str) -> Option<&'static str> {
    let collapsed = s
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.as_str() {
        "true" => Some("true"),
        "false" => Some("false"),
        "not given" => Some("not given"),
        _ => None,
    }
}

/// True / False / Not Given, compared after normalization.
pub fn true_false_not_given(submitted: &SubmittedAnswer, key: &AnswerKey) -> bool {
    let Some(answer) = submitted.as_single().and_then(canonical_tfng) else {
        return false;
    };
    key_tokens(key)
        .into_iter()
        .filter_map(canonical_tfng)
        .any(|expected| expected == answer)
}

fn normalize_pairs(pairs: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (normalize(k), normalize(v)))
        .collect()
}

/// Matching questions: pairwise normalized comparison for key/value answers,
/// normalized text otherwise.
pub fn matching(submitted: &SubmittedAnswer, key: &AnswerKey) -> bool {
    match (submitted, key) {
        (SubmittedAnswer::Pairs(given), AnswerKey::Pairs(expected)) => {
            !expected.is_empty() && normalize_pairs(given) == normalize_pairs(expected)
        }
        (_, AnswerKey::Pairs(_)) | (SubmittedAnswer::Pairs(_), _) => false,
        _ => normalized_text(submitted, key),
    }
}
