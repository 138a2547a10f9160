//! Exam definition parser.
//!
//! Loads exams from TOML or JSON files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Exam, QuestionDefinition, Section};
use crate::registry::{self, QuestionType};

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<QuestionDefinition>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    sections: Vec<String>,
}

/// Parse a single exam file. `.json` files are read as JSON, anything else as TOML.
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        parse_exam_json_str(&content, path)
    } else {
        parse_exam_str(&content, path)
    }
}

/// Parse a TOML string into an `Exam` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Exam {
        id: parsed.exam.id,
        title: parsed.exam.title,
        sections: parsed.exam.sections,
        questions: parsed.questions,
    })
}

/// Parse a JSON string into an `Exam`.
pub fn parse_exam_json_str(content: &str, source_path: &Path) -> Result<Exam> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
}

/// Recursively load all `.toml` and `.json` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(q: &QuestionDefinition, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(q.id.clone()),
            message: message.into(),
        }
    }
}

/// Validate an exam for problems that would make scoring fail or mislead.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "exam has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    let mut seen_numbers = HashSet::new();
    for q in &exam.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate question ID: {}", q.id),
            ));
        }
        if !seen_numbers.insert(q.number) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate question number: {}", q.number),
            ));
        }
    }

    let mut used_sections = HashSet::new();
    for q in &exam.questions {
        match q.section.parse::<Section>() {
            Ok(section) => {
                used_sections.insert(section);
            }
            Err(_) => warnings.push(ValidationWarning::question(
                q,
                format!("unknown section: {}", q.section),
            )),
        }

        if q.points == 0 {
            warnings.push(ValidationWarning::question(q, "question is worth zero points"));
        }

        let Some(rule) = registry::lookup(&q.question_type) else {
            warnings.push(ValidationWarning::question(
                q,
                format!("unknown question type: {}", q.question_type),
            ));
            continue;
        };

        let key = q.answer_key(rule.question_type);
        if rule.is_objective() && key.is_none() {
            warnings.push(ValidationWarning::question(
                q,
                "objective question has no answer key",
            ));
        }
        if matches!(
            rule.question_type,
            QuestionType::WritingTask1 | QuestionType::WritingTask2
        ) && key.is_some()
        {
            warnings.push(ValidationWarning::question(
                q,
                "writing question has an answer key that will be ignored",
            ));
        }
    }

    for name in &exam.sections {
        match name.parse::<Section>() {
            Ok(section) if !used_sections.contains(&section) => {
                warnings.push(ValidationWarning {
                    question_id: None,
                    message: format!("declared section {section} has no questions"),
                });
            }
            Ok(_) => {}
            Err(_) => warnings.push(ValidationWarning {
                question_id: None,
                message: format!("declared section is unknown: {name}"),
            }),
        }
    }

    warnings
}
