//! Aggregate statistics over a batch of graded sheets.
//!
//! Per-question correct rates are the classic item difficulty index: the
//! share of sheets answering the question correctly, with partial credit
//! counting as half.

use serde::{Deserialize, Serialize};

use crate::grading::Verdict;
use crate::report::SheetReport;

/// Statistics for one question across all sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    /// One-based question number.
    pub question: usize,
    pub correct: f64,
    pub wrong: u32,
    pub unmarked: f64,
    /// `correct / sheets`.
    pub correct_rate: f64,
}

/// Aggregate statistics for a graded batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub sheet_count: usize,
    pub mean_percentage: f64,
    pub min_percentage: f64,
    pub max_percentage: f64,
    pub per_question: Vec<QuestionStats>,
}

impl BatchStats {
    /// Questions ordered from hardest to easiest. Ties keep question order.
    pub fn hardest_questions(&self) -> Vec<&QuestionStats> {
        let mut ranked: Vec<&QuestionStats> = self.per_question.iter().collect();
        ranked.sort_by(|a, b| a.correct_rate.total_cmp(&b.correct_rate));
        ranked
    }
}

/// Compute batch statistics from graded sheets.
pub fn compute_batch_stats(sheets: &[SheetReport], question_count: usize) -> BatchStats {
    let mut per_question: Vec<QuestionStats> = (1..=question_count)
        .map(|question| QuestionStats {
            question,
            correct: 0.0,
            wrong: 0,
            unmarked: 0.0,
            correct_rate: 0.0,
        })
        .collect();

    if sheets.is_empty() {
        return BatchStats {
            per_question,
            ..Default::default()
        };
    }

    for sheet in sheets {
        for v in &sheet.verdicts {
            let Some(stats) = per_question.get_mut(v.question.wrapping_sub(1)) else {
                continue;
            };
            match v.verdict {
                Verdict::True => stats.correct += 1.0,
                Verdict::False => stats.wrong += 1,
                Verdict::PartialGrade => {
                    stats.correct += 0.5;
                    stats.unmarked += 0.5;
                }
                Verdict::Unmarked => stats.unmarked += 1.0,
            }
        }
    }

    let n = sheets.len() as f64;
    for stats in &mut per_question {
        stats.correct_rate = stats.correct / n;
    }

    let percentages: Vec<f64> = sheets.iter().map(|s| s.percentage).collect();
    let mean = percentages.iter().sum::<f64>() / n;
    let min = percentages.iter().copied().fold(f64::INFINITY, f64::min);
    let max = percentages.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    BatchStats {
        sheet_count: sheets.len(),
        mean_percentage: (mean * 100.0).round() / 100.0,
        min_percentage: min,
        max_percentage: max,
        per_question,
    }
}
