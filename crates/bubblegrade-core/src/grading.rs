//! Per-question grading against the answer key.
//!
//! Walks the questions in order with a cursor over the assigned marks, so
//! each verdict can be painted onto the marks that produced it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::grid::Assignment;
use crate::model::{letters, AnswerKey, Choice, GradingPolicy, Mark};

/// Outcome of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    False,
    PartialGrade,
    Unmarked,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::True => write!(f, "True"),
            Verdict::False => write!(f, "False"),
            Verdict::PartialGrade => write!(f, "Partial Grade"),
            Verdict::Unmarked => write!(f, "Unmarked"),
        }
    }
}

/// The verdict for one question together with what was compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionVerdict {
    /// One-based question number.
    pub question: usize,
    pub verdict: Verdict,
    /// Letters marked on the sheet, in detection order.
    pub marked: String,
    /// Letters in the answer key.
    pub expected: String,
}

impl QuestionVerdict {
    /// Human-readable line, e.g. `"3. Question is Partial Grade"`.
    pub fn label(&self) -> String {
        format!("{}. Question is {}", self.question, self.verdict)
    }
}

/// Running score for a sheet.
///
/// `correct` and `unmarked` move in halves under partial credit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GradingTally {
    pub correct: f64,
    pub wrong: u32,
    pub unmarked: f64,
}

impl GradingTally {
    /// Tally for a sheet where nothing was detected.
    pub fn all_unmarked(question_count: usize) -> Self {
        Self {
            correct: 0.0,
            wrong: 0,
            unmarked: question_count as f64,
        }
    }

    /// Sum of all three counters; equals the question count after grading.
    pub fn total(&self) -> f64 {
        self.correct + self.wrong as f64 + self.unmarked
    }

    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::True => self.correct += 1.0,
            Verdict::False => self.wrong += 1,
            Verdict::PartialGrade => {
                self.correct += 0.5;
                self.unmarked += 0.5;
            }
            Verdict::Unmarked => self.unmarked += 1.0,
        }
    }
}

/// Color category used when drawing a verdict on a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintColor {
    Correct,
    Wrong,
    Partial,
}

impl PaintColor {
    fn for_verdict(verdict: Verdict) -> Option<Self> {
        match verdict {
            Verdict::True => Some(PaintColor::Correct),
            Verdict::False => Some(PaintColor::Wrong),
            Verdict::PartialGrade => Some(PaintColor::Partial),
            Verdict::Unmarked => None,
        }
    }
}

/// Draw `mark` in `color`. `mark_index` points into [`Assignment::marks`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaintInstruction {
    pub mark_index: usize,
    pub question: usize,
    pub mark: Mark,
    pub color: PaintColor,
}

/// Everything produced by grading one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub tally: GradingTally,
    pub verdicts: Vec<QuestionVerdict>,
    pub paint: Vec<PaintInstruction>,
}

impl GradeOutcome {
    /// Outcome for a sheet with no detected marks: every question unmarked,
    /// nothing painted.
    pub fn unmarked(key: &AnswerKey) -> Self {
        let verdicts = key
            .entries()
            .iter()
            .enumerate()
            .map(|(i, expected)| QuestionVerdict {
                question: i + 1,
                verdict: Verdict::Unmarked,
                marked: String::new(),
                expected: letters(expected),
            })
            .collect();

        Self {
            tally: GradingTally::all_unmarked(key.len()),
            verdicts,
            paint: Vec::new(),
        }
    }
}

/// Decide one question from its key entry and marked letters.
pub fn judge(expected: &[Choice], marked: &[Choice], policy: GradingPolicy) -> Verdict {
    match (expected.len(), marked.len()) {
        (_, 0) => Verdict::Unmarked,
        (_, n) if n > 2 => Verdict::False,
        (1, 1) if expected[0] == marked[0] => Verdict::True,
        (1, _) => Verdict::False,
        (2, 1) if policy.partial_credit && expected.contains(&marked[0]) => {
            Verdict::PartialGrade
        }
        (2, 2) if same_letters(expected, marked) => Verdict::True,
        _ => Verdict::False,
    }
}

fn same_letters(a: &[Choice], b: &[Choice]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Grade an assignment against the answer key.
///
/// Fails with [`GradingError::AnswerKeyLength`] if the key does not cover
/// every assigned question, and with [`GradingError::MarksExhausted`] if a
/// question references more marks than assignment produced.
pub fn grade(
    assignment: &Assignment,
    key: &AnswerKey,
    policy: GradingPolicy,
) -> Result<GradeOutcome, GradingError> {
    if key.len() != assignment.question_count() {
        return Err(GradingError::AnswerKeyLength {
            expected: assignment.question_count(),
            actual: key.len(),
        });
    }

    let real = assignment.real_marks();
    let mut cursor = 0usize;
    let mut tally = GradingTally::default();
    let mut verdicts = Vec::with_capacity(key.len());
    let mut paint = Vec::new();

    for (i, (expected, marked)) in key
        .entries()
        .iter()
        .zip(&assignment.marked_options)
        .enumerate()
    {
        let consumed = marked.len();
        if cursor + consumed > real.len() {
            return Err(GradingError::MarksExhausted {
                question: i + 1,
                needed: consumed,
                available: real.len() - cursor,
            });
        }

        let verdict = judge(expected, marked, policy);
        tally.record(verdict);

        if let Some(color) = PaintColor::for_verdict(verdict) {
            paint.extend((cursor..cursor + consumed).map(|mark_index| PaintInstruction {
                mark_index,
                question: i + 1,
                mark: real[mark_index],
                color,
            }));
        }
        cursor += consumed;

        verdicts.push(QuestionVerdict {
            question: i + 1,
            verdict,
            marked: letters(marked),
            expected: letters(expected),
        });
    }

    Ok(GradeOutcome {
        tally,
        verdicts,
        paint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_letters;

    fn c(s: &str) -> Vec<Choice> {
        parse_letters(s).unwrap()
    }

    const PARTIAL: GradingPolicy = GradingPolicy {
        partial_credit: true,
    };
    const STRICT: GradingPolicy = GradingPolicy {
        partial_credit: false,
    };

    /// Build an assignment directly from marked letter strings, with one
    /// synthetic mark per letter.
    fn assignment_of(marked: &[&str]) -> Assignment {
        let marked_options: Vec<Vec<Choice>> = marked.iter().map(|s| c(s)).collect();
        let marks: Vec<Mark> = marked_options
            .iter()
            .enumerate()
            .flat_map(|(q, row)| {
                row.iter()
                    .map(move |ch| Mark::new(ch.index() as f64 * 10.0, q as f64 * 10.0 + 5.0, 3.0))
            })
            .collect();
        Assignment {
            real_count: marks.len(),
            marked_options,
            marks,
            stray: vec![],
        }
    }

    #[test]
    fn decision_table() {
        assert_eq!(judge(&c("B"), &c("B"), STRICT), Verdict::True);
        assert_eq!(judge(&c("B"), &c("C"), STRICT), Verdict::False);
        assert_eq!(judge(&c("B"), &c("BC"), PARTIAL), Verdict::False);
        assert_eq!(judge(&c("AC"), &c("A"), PARTIAL), Verdict::PartialGrade);
        assert_eq!(judge(&c("AC"), &c("C"), PARTIAL), Verdict::PartialGrade);
        assert_eq!(judge(&c("AC"), &c("A"), STRICT), Verdict::False);
        assert_eq!(judge(&c("AC"), &c("B"), PARTIAL), Verdict::False);
        assert_eq!(judge(&c("AC"), &c("CA"), STRICT), Verdict::True);
        assert_eq!(judge(&c("AC"), &c("AB"), STRICT), Verdict::False);
        assert_eq!(judge(&c("AC"), &c("AA"), STRICT), Verdict::False);
        assert_eq!(judge(&c("A"), &c("ABC"), PARTIAL), Verdict::False);
        assert_eq!(judge(&c("AB"), &c("ABD"), PARTIAL), Verdict::False);
        assert_eq!(judge(&c("A"), &[], PARTIAL), Verdict::Unmarked);
    }

    #[test]
    fn single_correct_answer() {
        let key = AnswerKey::from_letters(&["B"]).unwrap();
        let out = grade(&assignment_of(&["B"]), &key, STRICT).unwrap();
        assert_eq!(
            out.tally,
            GradingTally {
                correct: 1.0,
                wrong: 0,
                unmarked: 0.0
            }
        );
        assert_eq!(out.verdicts[0].label(), "1. Question is True");
        assert_eq!(out.paint.len(), 1);
        assert_eq!(out.paint[0].color, PaintColor::Correct);
    }

    #[test]
    fn partial_credit_for_one_of_two() {
        let key = AnswerKey::from_letters(&["AC"]).unwrap();
        let out = grade(&assignment_of(&["A"]), &key, PARTIAL).unwrap();
        assert_eq!(out.tally.correct, 0.5);
        assert_eq!(out.tally.unmarked, 0.5);
        assert_eq!(out.tally.wrong, 0);
        assert_eq!(out.verdicts[0].label(), "1. Question is Partial Grade");
        assert_eq!(out.paint[0].color, PaintColor::Partial);
    }

    #[test]
    fn over_marked_question_paints_every_mark_wrong() {
        let key = AnswerKey::from_letters(&["A"]).unwrap();
        let out = grade(&assignment_of(&["AB"]), &key, PARTIAL).unwrap();
        assert_eq!(out.tally.wrong, 1);
        assert_eq!(out.verdicts[0].verdict, Verdict::False);
        assert_eq!(out.paint.len(), 2);
        assert!(out.paint.iter().all(|p| p.color == PaintColor::Wrong));
    }

    #[test]
    fn cursor_skips_unmarked_and_tracks_multi_marks() {
        let key = AnswerKey::from_letters(&["A", "B", "CD", "A", "D"]).unwrap();
        let assignment = assignment_of(&["A", "", "DC", "ABC", "B"]);
        let out = grade(&assignment, &key, STRICT).unwrap();

        let verdicts: Vec<Verdict> = out.verdicts.iter().map(|v| v.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::True,
                Verdict::Unmarked,
                Verdict::True,
                Verdict::False,
                Verdict::False
            ]
        );

        let painted: Vec<(usize, usize, PaintColor)> = out
            .paint
            .iter()
            .map(|p| (p.question, p.mark_index, p.color))
            .collect();
        assert_eq!(
            painted,
            vec![
                (1, 0, PaintColor::Correct),
                (3, 1, PaintColor::Correct),
                (3, 2, PaintColor::Correct),
                (4, 3, PaintColor::Wrong),
                (4, 4, PaintColor::Wrong),
                (4, 5, PaintColor::Wrong),
                (5, 6, PaintColor::Wrong),
            ]
        );
        assert_eq!(out.paint[6].mark, assignment.marks[6]);
        assert_eq!(out.tally.total(), 5.0);
    }

    #[test]
    fn exhausted_marks_fail_the_sheet() {
        let key = AnswerKey::from_letters(&["A", "B"]).unwrap();
        let mut assignment = assignment_of(&["A", "B"]);
        assignment.real_count = 1;
        let err = grade(&assignment, &key, STRICT).unwrap_err();
        assert_eq!(
            err,
            GradingError::MarksExhausted {
                question: 2,
                needed: 1,
                available: 0
            }
        );
        assert!(err.is_detection_inconsistency());
    }

    #[test]
    fn real_count_past_the_marks_fails_cleanly() {
        let key = AnswerKey::from_letters(&["A", "B"]).unwrap();
        let mut assignment = assignment_of(&["A", "B"]);
        assignment.marks.truncate(1);
        assignment.real_count = 2;

        assert_eq!(assignment.real_marks().len(), 1);
        let err = grade(&assignment, &key, STRICT).unwrap_err();
        assert_eq!(
            err,
            GradingError::MarksExhausted {
                question: 2,
                needed: 1,
                available: 0
            }
        );
    }

    #[test]
    fn key_length_must_match() {
        let key = AnswerKey::from_letters(&["A"]).unwrap();
        let err = grade(&assignment_of(&["A", "B"]), &key, STRICT).unwrap_err();
        assert!(matches!(err, GradingError::AnswerKeyLength { .. }));
    }

    #[test]
    fn unmarked_outcome() {
        let key = AnswerKey::from_letters(&["B", "AC"]).unwrap();
        let out = GradeOutcome::unmarked(&key);
        assert_eq!(out.tally, GradingTally::all_unmarked(2));
        assert_eq!(out.verdicts[1].label(), "2. Question is Unmarked");
        assert_eq!(out.verdicts[1].expected, "AC");
        assert!(out.paint.is_empty());
    }
}
