//! Sheet grading pipeline.
//!
//! Ties assignment and grading together for one exam: the layout and answer
//! key are validated once, then any number of scans are graded against them.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::grading::{grade, GradeOutcome};
use crate::grid::{assign, Assignment};
use crate::model::{AnswerKey, GradingPolicy, SheetLayout, SheetScan};

/// A validated exam definition ready to grade scans.
#[derive(Debug, Clone)]
pub struct SheetGrader {
    layout: SheetLayout,
    key: AnswerKey,
    policy: GradingPolicy,
}

/// Result of grading one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutcome {
    pub sheet_id: String,
    /// `None` when the scan had no marks and grading was bypassed.
    pub assignment: Option<Assignment>,
    pub outcome: GradeOutcome,
}

impl SheetOutcome {
    /// Marked letters per question; empty strings when nothing was detected.
    pub fn marked_letters(&self) -> Vec<String> {
        match &self.assignment {
            Some(a) => a.marked_letters(),
            None => vec![String::new(); self.outcome.verdicts.len()],
        }
    }
}

/// A scan that could not be graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetFailure {
    pub sheet_id: String,
    pub error: String,
}

/// Results of grading several scans against the same exam.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub sheets: Vec<SheetOutcome>,
    pub failures: Vec<SheetFailure>,
}

impl SheetGrader {
    /// Validate the exam configuration. All configuration errors surface here,
    /// before any scan is looked at.
    pub fn new(
        layout: SheetLayout,
        key: AnswerKey,
        policy: GradingPolicy,
    ) -> Result<Self, GradingError> {
        layout.validate()?;
        key.check_against(&layout)?;
        Ok(Self {
            layout,
            key,
            policy,
        })
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    pub fn policy(&self) -> GradingPolicy {
        self.policy
    }

    /// Grade one scan.
    ///
    /// A scan without marks bypasses assignment and grading: every question is
    /// unmarked and nothing is painted.
    pub fn grade_sheet(&self, scan: &SheetScan) -> Result<SheetOutcome, GradingError> {
        let marks = match scan.marks.as_deref() {
            Some(marks) if !marks.is_empty() => marks,
            _ => {
                tracing::debug!(sheet = %scan.id, "no marks detected, grading skipped");
                return Ok(SheetOutcome {
                    sheet_id: scan.id.clone(),
                    assignment: None,
                    outcome: GradeOutcome::unmarked(&self.key),
                });
            }
        };

        let assignment = assign(marks, &self.layout, scan.image_height)?;
        if !assignment.stray.is_empty() {
            tracing::debug!(
                sheet = %scan.id,
                stray = assignment.stray.len(),
                "some marks were not assigned to any question"
            );
        }

        let outcome = grade(&assignment, &self.key, self.policy)?;
        tracing::debug!(
            sheet = %scan.id,
            correct = outcome.tally.correct,
            wrong = outcome.tally.wrong,
            unmarked = outcome.tally.unmarked,
            "sheet graded"
        );

        Ok(SheetOutcome {
            sheet_id: scan.id.clone(),
            assignment: Some(assignment),
            outcome,
        })
    }

    /// Grade every scan. A scan that fails is recorded and skipped; the rest
    /// of the batch is unaffected.
    pub fn grade_batch(&self, scans: &[SheetScan]) -> BatchOutcome {
        let start = Instant::now();
        let mut batch = BatchOutcome::default();

        for scan in scans {
            match self.grade_sheet(scan) {
                Ok(sheet) => batch.sheets.push(sheet),
                Err(e) => {
                    tracing::warn!("skipping sheet {}: {}", scan.id, e);
                    batch.failures.push(SheetFailure {
                        sheet_id: scan.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            graded = batch.sheets.len(),
            failed = batch.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch complete"
        );
        batch
    }
}
