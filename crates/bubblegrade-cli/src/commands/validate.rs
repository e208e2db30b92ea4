//! The `bubblegrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use bubblegrade_core::model::letters;
use bubblegrade_core::parser;

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let exam = parser::parse_exam(&exam_path)?;
    // Hard errors (key length, cardinality, letter range) fail here.
    exam.grader()?;

    println!(
        "Exam: {} ({} questions, {} choices{})",
        exam.name,
        exam.layout.question_count,
        exam.layout.choice_count,
        if exam.policy.partial_credit {
            ", partial credit"
        } else {
            ""
        }
    );

    if !exam.description.is_empty() {
        println!("  {}", exam.description);
    }

    let key: Vec<String> = exam.key.entries().iter().map(|e| letters(e)).collect();
    println!("Answer key: {}", key.join(" "));

    let warnings = parser::validate_exam(&exam);
    for w in &warnings {
        let prefix = w
            .question
            .map(|q| format!("  [Q{q}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Exam valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
