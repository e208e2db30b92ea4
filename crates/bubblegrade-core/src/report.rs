//! Grading report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{BatchOutcome, SheetFailure, SheetOutcome};
use crate::grading::{GradingTally, PaintInstruction, QuestionVerdict};
use crate::model::{letters, Mark};
use crate::parser::Exam;
use crate::statistics::{compute_batch_stats, BatchStats};

/// Grade as a percentage of questions, rounded to two decimals.
pub fn grade_percentage(tally: &GradingTally, question_count: usize) -> f64 {
    if question_count == 0 {
        return 0.0;
    }
    let pct = tally.correct / question_count as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// The graded result of one sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetReport {
    pub sheet_id: String,
    pub tally: GradingTally,
    pub percentage: f64,
    /// Letters detected per question.
    pub marked_options: Vec<String>,
    pub verdicts: Vec<QuestionVerdict>,
    pub paint: Vec<PaintInstruction>,
    /// Marks no question could claim.
    #[serde(default)]
    pub stray_marks: Vec<Mark>,
}

impl SheetReport {
    pub fn from_outcome(sheet: &SheetOutcome) -> Self {
        let question_count = sheet.outcome.verdicts.len();
        Self {
            sheet_id: sheet.sheet_id.clone(),
            tally: sheet.outcome.tally,
            percentage: grade_percentage(&sheet.outcome.tally, question_count),
            marked_options: sheet.marked_letters(),
            verdicts: sheet.outcome.verdicts.clone(),
            paint: sheet.outcome.paint.clone(),
            stray_marks: sheet
                .assignment
                .as_ref()
                .map(|a| a.stray.clone())
                .unwrap_or_default(),
        }
    }

    /// Question labels, e.g. `"1. Question is True"`.
    pub fn labels(&self) -> Vec<String> {
        self.verdicts.iter().map(QuestionVerdict::label).collect()
    }
}

/// Summary of the exam a report was graded against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub question_count: usize,
    pub choice_count: usize,
    pub partial_credit: bool,
    pub answer_key: Vec<String>,
}

impl ExamSummary {
    pub fn from_exam(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            name: exam.name.clone(),
            description: exam.description.clone(),
            question_count: exam.layout.question_count,
            choice_count: exam.layout.choice_count,
            partial_credit: exam.policy.partial_credit,
            answer_key: exam.key.entries().iter().map(|e| letters(e)).collect(),
        }
    }
}

/// A complete grading run over one or more sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub exam: ExamSummary,
    pub sheets: Vec<SheetReport>,
    /// Sheets that could not be graded.
    pub failures: Vec<SheetFailure>,
    pub aggregate: BatchStats,
}

impl BatchReport {
    pub fn new(exam: &Exam, batch: &BatchOutcome) -> Self {
        let sheets: Vec<SheetReport> = batch.sheets.iter().map(SheetReport::from_outcome).collect();
        let aggregate = compute_batch_stats(&sheets, exam.layout.question_count);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exam: ExamSummary::from_exam(exam),
            sheets,
            failures: batch.failures.clone(),
            aggregate,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn sheet(&self, sheet_id: &str) -> Option<&SheetReport> {
        self.sheets.iter().find(|s| s.sheet_id == sheet_id)
    }
}
