//! Mark-to-grid assignment.
//!
//! Recovers the answer grid from unordered detected marks: columns come from
//! the spread of x positions, rows from fixed-height bands over the image.
//! Marks are walked top to bottom against the current question's band, with
//! a one-band lookback for marks whose centers jittered across a boundary.

use tracing::debug;

use crate::error::GradingError;
use crate::model::{letters, Choice, Mark, SheetLayout};

/// One sheet's marks assigned to the answer grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Letters marked per question, in detection order.
    pub marked_options: Vec<Vec<Choice>>,
    /// Consumed marks grouped by question in question order, followed by
    /// zeroed padding up to the layout's padding floor.
    pub marks: Vec<Mark>,
    /// Number of leading entries in `marks` that are real detections.
    pub real_count: usize,
    /// Marks that no row band could claim.
    pub stray: Vec<Mark>,
}

impl Assignment {
    /// An assignment with every question unmarked.
    pub fn unmarked(layout: &SheetLayout) -> Self {
        Self {
            marked_options: vec![Vec::new(); layout.question_count],
            marks: vec![Mark::default(); layout.padding_floor()],
            real_count: 0,
            stray: Vec::new(),
        }
    }

    pub fn question_count(&self) -> usize {
        self.marked_options.len()
    }

    /// The consumed marks without padding. A `real_count` past the end of
    /// `marks` is clamped to what is actually there.
    pub fn real_marks(&self) -> &[Mark] {
        &self.marks[..self.real_count.min(self.marks.len())]
    }

    /// Marked letters per question as strings, e.g. `["B", "", "AC"]`.
    pub fn marked_letters(&self) -> Vec<String> {
        self.marked_options.iter().map(|m| letters(m)).collect()
    }
}

/// Column classifier fitted to one sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnModel {
    min_x: f64,
    width: f64,
    tolerance: f64,
    choice_count: usize,
}

impl ColumnModel {
    /// Fit the column geometry from the layout's pinned span, or from the
    /// extent of the marks' x positions.
    pub fn fit(marks: &[Mark], layout: &SheetLayout) -> Result<Self, GradingError> {
        layout.validate()?;

        let (min_x, max_x) = match layout.column_span {
            Some(span) => (span.first_x, span.last_x),
            None => marks
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
                    (lo.min(m.x), hi.max(m.x))
                }),
        };

        let width = (max_x - min_x) / (layout.choice_count - 1) as f64;
        if !(width.is_finite() && width > 0.0) {
            return Err(GradingError::ZeroColumnSpread { x: min_x });
        }

        Ok(Self {
            min_x,
            width,
            tolerance: width / 4.0,
            choice_count: layout.choice_count,
        })
    }

    /// Distance between neighbouring choice columns.
    pub fn column_width(&self) -> f64 {
        self.width
    }

    /// Nearest column for an x position, shifted by a quarter column.
    pub fn classify(&self, x: f64) -> Choice {
        let raw = ((x - self.min_x + self.tolerance) / self.width).round();
        let index = raw.clamp(0.0, (self.choice_count - 1) as f64) as usize;
        Choice::clamped(index, self.choice_count)
    }
}

/// The vertical band of one question, open at both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowWindow {
    top: f64,
    bottom: f64,
}

impl RowWindow {
    fn for_question(question: usize, row_height: f64) -> Self {
        Self {
            top: question as f64 * row_height,
            bottom: (question + 1) as f64 * row_height,
        }
    }

    // Strict on both sides: a center exactly on a boundary belongs to neither band.
    fn contains(&self, y: f64) -> bool {
        self.top < y && y < self.bottom
    }
}

/// Where the next pending mark goes relative to the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Inside the current question's band.
    Current,
    /// Inside the band just above; a late match for the previous question.
    Previous,
    /// Above every band still open; no later question can claim it.
    Stale,
    /// Below the current band; wait for a later question.
    Ahead,
}

fn place(y: f64, question: usize, row_height: f64) -> Placement {
    let current = RowWindow::for_question(question, row_height);
    let previous = question
        .checked_sub(1)
        .map(|q| RowWindow::for_question(q, row_height));

    if current.contains(y) {
        Placement::Current
    } else if previous.is_some_and(|w| w.contains(y)) {
        Placement::Previous
    } else if y <= current.top {
        Placement::Stale
    } else {
        Placement::Ahead
    }
}

/// Assign detected marks to (question, choice) cells.
///
/// `image_height` is split into `question_count` equal row bands. An empty
/// `marks` slice yields an all-unmarked assignment without fitting columns.
pub fn assign(
    marks: &[Mark],
    layout: &SheetLayout,
    image_height: f64,
) -> Result<Assignment, GradingError> {
    layout.validate()?;
    if !(image_height.is_finite() && image_height > 0.0) {
        return Err(GradingError::InvalidImageHeight(image_height));
    }
    if marks.is_empty() {
        return Ok(Assignment::unmarked(layout));
    }

    let columns = ColumnModel::fit(marks, layout)?;
    let row_height = image_height / layout.question_count as f64;

    let mut sorted = marks.to_vec();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut rows: Vec<Vec<Mark>> = vec![Vec::new(); layout.question_count];
    let mut stray = Vec::new();
    let mut pending = sorted.into_iter().peekable();

    for question in 0..layout.question_count {
        while let Some(&mark) = pending.peek() {
            match place(mark.y, question, row_height) {
                Placement::Current => rows[question].push(mark),
                Placement::Previous => rows[question - 1].push(mark),
                Placement::Stale => {
                    debug!(x = mark.x, y = mark.y, question, "mark falls between rows");
                    stray.push(mark);
                }
                Placement::Ahead => break,
            }
            pending.next();
        }
    }

    for mark in pending {
        debug!(x = mark.x, y = mark.y, "mark below the last row");
        stray.push(mark);
    }

    let marked_options: Vec<Vec<Choice>> = rows
        .iter()
        .map(|row| row.iter().map(|m| columns.classify(m.x)).collect())
        .collect();

    let mut ordered: Vec<Mark> = rows.into_iter().flatten().collect();
    let real_count = ordered.len();
    ordered.resize(real_count.max(layout.padding_floor()), Mark::default());

    debug!(
        assigned = real_count,
        stray = stray.len(),
        column_width = columns.column_width(),
        "assigned marks to grid"
    );

    Ok(Assignment {
        marked_options,
        marks: ordered,
        real_count,
        stray,
    })
}
