//! The `examscore init` command.

use std::path::Path;

use anyhow::Result;

fn write_if_absent(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_if_absent(Path::new("examscore.toml"), SAMPLE_CONFIG)?;
    write_if_absent(Path::new("examscore-data/exams/practice-1.toml"), SAMPLE_EXAM)?;
    write_if_absent(
        Path::new("examscore-data/submissions/sub-001.json"),
        SAMPLE_SUBMISSION_1,
    )?;
    write_if_absent(
        Path::new("examscore-data/submissions/sub-002.json"),
        SAMPLE_SUBMISSION_2,
    )?;

    println!("\nNext steps:");
    println!("  1. Run: examscore validate --exam examscore-data/exams");
    println!("  2. Run: examscore score-all");
    println!("  3. Run: examscore show --submission sub-001");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examscore configuration

data_dir = "./examscore-data"
output_dir = "./examscore-results"
parallelism = 4
"#;

const SAMPLE_EXAM: &str = r#"[exam]
id = "practice-1"
title = "Practice Test 1"
sections = ["Listening", "Reading", "Writing"]

[[questions]]
id = "l1"
number = 1
type = "mcq_single"
section = "Listening"
text = "Where is the library?"

[[questions.options]]
id = "A"
text = "Next to the station"
correct = true

[[questions.options]]
id = "B"
text = "Behind the park"

[[questions]]
id = "l2"
number = 2
type = "form_completion"
section = "Listening"
text = "Name of the street: ______"
correct_answer = ["Harbour Road", "Harbor Road"]

[[questions]]
id = "r1"
number = 3
type = "true_false_ng"
section = "Reading"
text = "The bridge was completed in 1890."
correct_answer = "Not Given"

[[questions]]
id = "r2"
number = 4
type = "mcq_multiple"
section = "Reading"
text = "Which TWO materials were used?"
correct_answer = ["B", "D"]

[[questions]]
id = "r3"
number = 5
type = "matching_headings"
section = "Reading"
correct_answer = { "A" = "iii", "B" = "i" }

[[questions]]
id = "w1"
number = 6
type = "writing_task2"
section = "Writing"
text = "Discuss both views and give your opinion."
"#;

const SAMPLE_SUBMISSION_1: &str = r#"{
  "id": "sub-001",
  "exam_id": "practice-1",
  "student_id": "student-1",
  "answers": {
    "l1": "A",
    "l2": "harbour road",
    "r1": "not given",
    "r2": ["D", "B"],
    "r3": { "A": "iii", "B": "I" },
    "w1": "Some people believe..."
  },
  "time_spent_secs": 3420
}
"#;

const SAMPLE_SUBMISSION_2: &str = r#"{
  "id": "sub-002",
  "exam_id": "practice-1",
  "student_id": "student-2",
  "answers": {
    "q_1": "B",
    "q_3": "False",
    "q_4": ["B", "C"]
  },
  "time_spent_secs": 2710
}
"#;
