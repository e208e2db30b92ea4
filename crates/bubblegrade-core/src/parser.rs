//! Exam and scan file loading.
//!
//! Exams are TOML files holding the layout, grading policy and answer key.
//! Scans are JSON files written by the circle detector.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::engine::SheetGrader;
use crate::model::{AnswerKey, ColumnSpan, GradingPolicy, SheetLayout, SheetScan};

/// A parsed exam definition.
#[derive(Debug, Clone)]
pub struct Exam {
    pub id: String,
    pub name: String,
    pub description: String,
    pub layout: SheetLayout,
    pub policy: GradingPolicy,
    pub key: AnswerKey,
}

impl Exam {
    /// Validate the exam into a grader.
    pub fn grader(&self) -> Result<SheetGrader> {
        SheetGrader::new(self.layout.clone(), self.key.clone(), self.policy)
            .with_context(|| format!("invalid exam '{}'", self.id))
    }
}

/// Intermediate TOML structure for parsing exam files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    answer_key: Vec<String>,
    exam: TomlExamHeader,
    #[serde(default)]
    layout: Option<TomlLayout>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    question_count: Option<usize>,
    #[serde(default = "default_choice_count")]
    choice_count: usize,
    #[serde(default)]
    partial_credit: bool,
}

fn default_choice_count() -> usize {
    4
}

#[derive(Debug, Deserialize)]
struct TomlLayout {
    #[serde(default)]
    first_column_x: Option<f64>,
    #[serde(default)]
    last_column_x: Option<f64>,
    #[serde(default)]
    padding_floor: Option<usize>,
}

/// Parse a single TOML exam file.
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `Exam` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let key = AnswerKey::from_letters(parsed.answer_key.as_slice())
        .with_context(|| format!("invalid answer key in {}", source_path.display()))?;

    let question_count = parsed.exam.question_count.unwrap_or(key.len());

    let (column_span, padding_floor) = match parsed.layout {
        Some(layout) => {
            let span = match (layout.first_column_x, layout.last_column_x) {
                (Some(first_x), Some(last_x)) => Some(ColumnSpan { first_x, last_x }),
                (None, None) => None,
                _ => anyhow::bail!(
                    "{}: first_column_x and last_column_x must be set together",
                    source_path.display()
                ),
            };
            (span, layout.padding_floor)
        }
        None => (None, None),
    };

    let layout = SheetLayout {
        question_count,
        choice_count: parsed.exam.choice_count,
        column_span,
        padding_floor,
    };

    Ok(Exam {
        name: parsed.exam.name.unwrap_or_else(|| parsed.exam.id.clone()),
        id: parsed.exam.id,
        description: parsed.exam.description,
        layout,
        policy: GradingPolicy {
            partial_credit: parsed.exam.partial_credit,
        },
        key,
    })
}

/// Parse a single JSON scan file. The sheet id defaults to the file stem.
pub fn parse_scan(path: &Path) -> Result<SheetScan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scan file: {}", path.display()))?;

    let mut scan: SheetScan = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse scan JSON: {}", path.display()))?;

    if scan.id.is_empty() {
        scan.id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(scan)
}

/// Recursively load all `.json` scans from a directory, sorted by path.
pub fn load_scan_directory(dir: &Path) -> Result<Vec<SheetScan>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    collect_json_paths(dir, &mut paths)?;
    paths.sort();

    let mut scans = Vec::new();
    for path in paths {
        match parse_scan(&path) {
            Ok(scan) => scans.push(scan),
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(scans)
}

fn collect_json_paths(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_paths(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The one-based question number (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check an exam for mistakes that are legal but probably unintended.
///
/// Hard errors (bad cardinality, letters out of range, wrong key length) are
/// reported by [`Exam::grader`] instead.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let multi_answer: Vec<usize> = exam
        .key
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.len() == 2)
        .map(|(i, _)| i + 1)
        .collect();

    if exam.policy.partial_credit && multi_answer.is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "partial_credit is enabled but no question has two correct answers".into(),
        });
    }

    if !exam.policy.partial_credit {
        for question in &multi_answer {
            warnings.push(ValidationWarning {
                question: Some(*question),
                message: "two correct answers without partial_credit: marking only one scores as wrong"
                    .into(),
            });
        }
    }

    // Every key entry uses only the first choices: choice_count may be too high.
    let highest = exam
        .key
        .entries()
        .iter()
        .flatten()
        .map(|c| c.index() + 1)
        .max()
        .unwrap_or(0);
    if exam.key.len() >= 5 && highest < exam.layout.choice_count {
        warnings.push(ValidationWarning {
            question: None,
            message: format!(
                "no answer uses the last {} choice column(s); check choice_count",
                exam.layout.choice_count - highest
            ),
        });
    }

    if let Some(floor) = exam.layout.padding_floor {
        if floor < exam.layout.question_count {
            warnings.push(ValidationWarning {
                question: None,
                message: format!(
                    "padding_floor {floor} is below the question count {}",
                    exam.layout.question_count
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
answer_key = ["B", "AC", "D", "A", "C"]

[exam]
id = "quiz-1"
name = "Quiz 1"
description = "Five question quiz"
question_count = 5
choice_count = 4
partial_credit = true

[layout]
first_column_x = 120.0
last_column_x = 420.0
padding_floor = 20
"#;

    #[test]
    fn parse_valid_toml() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("quiz.toml")).unwrap();
        assert_eq!(exam.id, "quiz-1");
        assert_eq!(exam.name, "Quiz 1");
        assert_eq!(exam.layout.question_count, 5);
        assert_eq!(exam.layout.choice_count, 4);
        assert_eq!(
            exam.layout.column_span,
            Some(ColumnSpan {
                first_x: 120.0,
                last_x: 420.0
            })
        );
        assert_eq!(exam.layout.padding_floor(), 20);
        assert!(exam.policy.partial_credit);
        assert_eq!(exam.key.get(1).unwrap().len(), 2);
        assert!(exam.grader().is_ok());
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
answer_key = ["A", "B"]

[exam]
id = "minimal"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("min.toml")).unwrap();
        assert_eq!(exam.name, "minimal");
        assert_eq!(exam.layout.question_count, 2);
        assert_eq!(exam.layout.choice_count, 4);
        assert!(exam.layout.column_span.is_none());
        assert!(!exam.policy.partial_credit);
    }

    #[test]
    fn bad_answer_key_is_rejected() {
        let toml = r#"
answer_key = ["A", "ABC"]

[exam]
id = "bad"
"#;
        let err = parse_exam_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("1 or 2 letters"));
    }

    #[test]
    fn mismatched_question_count_fails_at_grader() {
        let toml = r#"
answer_key = ["A", "B"]

[exam]
id = "short"
question_count = 3
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("short.toml")).unwrap();
        let err = exam.grader().unwrap_err();
        assert!(format!("{err:#}").contains("expected 3"));
    }

    #[test]
    fn half_column_span_is_rejected() {
        let toml = r#"
answer_key = ["A"]

[exam]
id = "half"

[layout]
first_column_x = 10.0
"#;
        assert!(parse_exam_str(toml, &PathBuf::from("half.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_exam_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_partial_credit_without_multi_answers() {
        let toml = r#"
answer_key = ["A", "B"]

[exam]
id = "single"
partial_credit = true
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("single.toml")).unwrap();
        let warnings = validate_exam(&exam);
        assert!(warnings.iter().any(|w| w.message.contains("partial_credit")));
    }

    #[test]
    fn validate_multi_answer_without_partial_credit() {
        let toml = r#"
answer_key = ["A", "BD"]

[exam]
id = "strict"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("strict.toml")).unwrap();
        let warnings = validate_exam(&exam);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].question, Some(2));
    }

    #[test]
    fn valid_exam_has_no_warnings() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("quiz.toml")).unwrap();
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn load_scans_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("alice.json"),
            r#"{"image_height": 500.0, "marks": [{"x": 120.0, "y": 50.0, "radius": 9.0}]}"#,
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(
            dir.path().join("nested/bob.json"),
            r#"{"id": "bob-2", "image_height": 500.0, "marks": null}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scans = load_scan_directory(dir.path()).unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].id, "alice");
        assert_eq!(scans[0].marks.as_ref().unwrap().len(), 1);
        assert_eq!(scans[1].id, "bob-2");
        assert!(scans[1].has_no_marks());
    }
}
