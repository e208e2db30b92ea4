//! End-to-end sheet scenarios: detected marks in, verdicts and tallies out.

use bubblegrade_core::engine::SheetGrader;
use bubblegrade_core::grading::{PaintColor, Verdict};
use bubblegrade_core::model::{AnswerKey, GradingPolicy, Mark, SheetLayout, SheetScan};
use bubblegrade_core::report::{grade_percentage, SheetReport};

/// Columns A..D at x = 100, 150, 200, 250; 100px per question row.
fn grader(key: &[&str], partial_credit: bool) -> SheetGrader {
    SheetGrader::new(
        SheetLayout::new(key.len(), 4).with_column_span(100.0, 250.0),
        AnswerKey::from_letters(key).unwrap(),
        GradingPolicy { partial_credit },
    )
    .unwrap()
}

fn mark(question: usize, letter: char) -> Mark {
    let column = (letter as u8 - b'A') as f64;
    Mark::new(100.0 + 50.0 * column, 50.0 + 100.0 * question as f64, 11.0)
}

fn scan(questions: usize, marks: Option<Vec<Mark>>) -> SheetScan {
    SheetScan::new("scenario", 100.0 * questions as f64, marks)
}

#[test]
fn single_correct_mark() {
    let sheet = grader(&["B"], false)
        .grade_sheet(&scan(1, Some(vec![mark(0, 'B')])))
        .unwrap();
    let tally = sheet.outcome.tally;
    assert_eq!((tally.correct, tally.wrong, tally.unmarked), (1.0, 0, 0.0));
    assert_eq!(sheet.outcome.verdicts[0].label(), "1. Question is True");
    assert_eq!(sheet.outcome.paint[0].color, PaintColor::Correct);
}

#[test]
fn zero_marks_is_unmarked() {
    let sheet = grader(&["B"], false)
        .grade_sheet(&scan(1, Some(vec![])))
        .unwrap();
    assert_eq!(sheet.outcome.verdicts[0].label(), "1. Question is Unmarked");
    assert_eq!(sheet.outcome.tally.unmarked, 1.0);
}

#[test]
fn partial_credit_for_one_of_two_answers() {
    let sheet = grader(&["AC"], true)
        .grade_sheet(&scan(1, Some(vec![mark(0, 'A')])))
        .unwrap();
    assert_eq!(sheet.outcome.tally.correct, 0.5);
    assert_eq!(sheet.outcome.tally.unmarked, 0.5);
    assert_eq!(sheet.outcome.verdicts[0].verdict, Verdict::PartialGrade);
    assert_eq!(
        sheet.outcome.verdicts[0].label(),
        "1. Question is Partial Grade"
    );
    assert_eq!(sheet.outcome.paint[0].color, PaintColor::Partial);
}

#[test]
fn two_marks_against_single_answer_are_wrong() {
    let sheet = grader(&["A"], true)
        .grade_sheet(&scan(1, Some(vec![mark(0, 'A'), mark(0, 'B')])))
        .unwrap();
    assert_eq!(sheet.marked_letters(), vec!["AB"]);
    assert_eq!(sheet.outcome.tally.wrong, 1);
    assert_eq!(sheet.outcome.verdicts[0].label(), "1. Question is False");
    assert_eq!(sheet.outcome.paint.len(), 2);
    assert!(sheet
        .outcome
        .paint
        .iter()
        .all(|p| p.color == PaintColor::Wrong));
}

#[test]
fn no_detection_bypasses_grading() {
    let sheet = grader(&["A", "B", "C", "D", "AB"], true)
        .grade_sheet(&scan(5, None))
        .unwrap();
    let tally = sheet.outcome.tally;
    assert_eq!((tally.correct, tally.wrong, tally.unmarked), (0.0, 0, 5.0));
    assert!(sheet.assignment.is_none());
    assert!(sheet.outcome.paint.is_empty());
}

#[test]
fn full_sheet_with_noise() {
    let key = ["A", "BD", "C", "D", "AC", "B"];
    let mut marks = vec![
        mark(0, 'A'),
        mark(1, 'D'),
        mark(1, 'B'),
        // question 3 left blank
        mark(3, 'A'),
        mark(3, 'B'),
        mark(3, 'C'),
        mark(4, 'C'),
        mark(5, 'B'),
    ];
    // Jitter a few centers within their row.
    marks[1].y += 40.0;
    marks[6].y -= 45.0;
    marks[7].x += 9.0;
    // A stray detection below the sheet.
    marks.push(Mark::new(180.0, 640.0, 6.0));
    marks.reverse();

    let sheet = grader(&key, true)
        .grade_sheet(&scan(key.len(), Some(marks)))
        .unwrap();

    assert_eq!(sheet.marked_letters(), vec!["A", "BD", "", "CBA", "C", "B"]);
    let verdicts: Vec<Verdict> = sheet.outcome.verdicts.iter().map(|v| v.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            Verdict::True,
            Verdict::True,
            Verdict::Unmarked,
            Verdict::False,
            Verdict::PartialGrade,
            Verdict::True,
        ]
    );
    let tally = sheet.outcome.tally;
    assert_eq!(tally.correct, 3.5);
    assert_eq!(tally.wrong, 1);
    assert_eq!(tally.unmarked, 1.5);
    assert_eq!(sheet.assignment.as_ref().unwrap().stray.len(), 1);
    assert_eq!(sheet.outcome.paint.len(), 8);

    let report = SheetReport::from_outcome(&sheet);
    assert_eq!(report.percentage, grade_percentage(&tally, key.len()));
    assert_eq!(report.percentage, 58.33);
}
