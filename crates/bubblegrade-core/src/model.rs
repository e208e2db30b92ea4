//! Core data model types for bubblegrade.
//!
//! These are the fundamental types shared by grid assignment, grading and
//! reporting: detected marks, the sheet layout, choice letters and the
//! answer key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GradingError;

/// Largest supported number of choices per question (`A..=Z`).
pub const MAX_CHOICES: usize = 26;

/// A detected filled circle in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Mark {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Mark {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }
}

/// A choice column, stored as its zero-based index (`0` is `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Choice(u8);

impl Choice {
    /// Build a choice from a column index. Returns `None` past `Z`.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < MAX_CHOICES).then(|| Choice(index as u8))
    }

    /// Column index clamped into the first `choice_count` letters.
    pub fn clamped(index: usize, choice_count: usize) -> Self {
        let last = choice_count.clamp(1, MAX_CHOICES) - 1;
        Choice(index.min(last) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for Choice {
    type Error = String;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(Choice(upper as u8 - b'A'))
        } else {
            Err(format!("not a choice letter: '{c}'"))
        }
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Choice::try_from(c),
            _ => Err(format!("expected a single choice letter, got '{s}'")),
        }
    }
}

impl TryFrom<String> for Choice {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Choice> for String {
    fn from(c: Choice) -> Self {
        c.to_string()
    }
}

/// Parse a run of letters such as `"AC"` into choices.
pub fn parse_letters(s: &str) -> Result<Vec<Choice>, String> {
    s.trim().chars().map(Choice::try_from).collect()
}

/// Render choices back into a letter string (`[A, C]` becomes `"AC"`).
pub fn letters(choices: &[Choice]) -> String {
    choices.iter().map(|c| c.letter()).collect()
}

/// Known x positions of the first and last choice columns.
///
/// When set on a layout, these replace the column extents inferred from the
/// detected marks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub first_x: f64,
    pub last_x: f64,
}

/// The answer grid of one sheet: rows are questions, columns are choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub question_count: usize,
    pub choice_count: usize,
    /// Pinned column geometry. Inferred from the marks when absent.
    #[serde(default)]
    pub column_span: Option<ColumnSpan>,
    /// Minimum length of the padded mark list. Defaults to the question count.
    #[serde(default)]
    pub padding_floor: Option<usize>,
}

impl SheetLayout {
    pub fn new(question_count: usize, choice_count: usize) -> Self {
        Self {
            question_count,
            choice_count,
            column_span: None,
            padding_floor: None,
        }
    }

    pub fn with_column_span(mut self, first_x: f64, last_x: f64) -> Self {
        self.column_span = Some(ColumnSpan { first_x, last_x });
        self
    }

    pub fn with_padding_floor(mut self, floor: usize) -> Self {
        self.padding_floor = Some(floor);
        self
    }

    /// Number of entries the ordered mark list is padded up to.
    pub fn padding_floor(&self) -> usize {
        self.padding_floor.unwrap_or(self.question_count)
    }

    /// Check the layout's shape before any sheet is processed.
    pub fn validate(&self) -> Result<(), GradingError> {
        if self.question_count == 0 {
            return Err(GradingError::NoQuestions);
        }
        if self.choice_count < 2 {
            return Err(GradingError::TooFewChoices(self.choice_count));
        }
        if self.choice_count > MAX_CHOICES {
            return Err(GradingError::TooManyChoices(self.choice_count));
        }
        if let Some(span) = self.column_span {
            if !(span.first_x.is_finite() && span.last_x.is_finite())
                || span.last_x <= span.first_x
            {
                return Err(GradingError::InvalidColumnSpan {
                    first_x: span.first_x,
                    last_x: span.last_x,
                });
            }
        }
        Ok(())
    }
}

/// The correct letters for every question, in question order.
///
/// Each entry holds one or two distinct letters; anything else is rejected
/// on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AnswerKey(Vec<Vec<Choice>>);

impl AnswerKey {
    pub fn new(entries: Vec<Vec<Choice>>) -> Result<Self, GradingError> {
        for (i, entry) in entries.iter().enumerate() {
            if !(1..=2).contains(&entry.len()) {
                return Err(GradingError::AnswerKeyCardinality {
                    question: i + 1,
                    len: entry.len(),
                });
            }
            if entry.len() == 2 && entry[0] == entry[1] {
                return Err(GradingError::DuplicateAnswerLetter {
                    question: i + 1,
                    letter: entry[0].letter(),
                });
            }
        }
        Ok(Self(entries))
    }

    /// Parse a key from letter strings such as `["B", "AC"]`.
    pub fn from_letters<S: AsRef<str>>(entries: &[S]) -> Result<Self, GradingError> {
        let parsed = entries
            .iter()
            .enumerate()
            .map(|(i, s)| {
                parse_letters(s.as_ref()).map_err(|reason| GradingError::AnswerKeyEntry {
                    question: i + 1,
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[Vec<Choice>] {
        &self.0
    }

    pub fn get(&self, question: usize) -> Option<&[Choice]> {
        self.0.get(question).map(Vec::as_slice)
    }

    /// Check the key against a layout: one entry per question, letters in range.
    pub fn check_against(&self, layout: &SheetLayout) -> Result<(), GradingError> {
        if self.0.len() != layout.question_count {
            return Err(GradingError::AnswerKeyLength {
                expected: layout.question_count,
                actual: self.0.len(),
            });
        }
        for (i, entry) in self.0.iter().enumerate() {
            if let Some(out) = entry.iter().find(|c| c.index() >= layout.choice_count) {
                return Err(GradingError::AnswerKeyLetter {
                    question: i + 1,
                    letter: out.letter(),
                    choice_count: layout.choice_count,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for AnswerKey {
    type Error = GradingError;

    fn try_from(entries: Vec<String>) -> Result<Self, Self::Error> {
        AnswerKey::from_letters(entries.as_slice())
    }
}

impl From<AnswerKey> for Vec<String> {
    fn from(key: AnswerKey) -> Self {
        key.0.iter().map(|e| letters(e)).collect()
    }
}

/// How the grader treats partially answered multi-answer questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradingPolicy {
    /// Award half credit when one of two correct letters is marked alone.
    #[serde(default)]
    pub partial_credit: bool,
}

/// One scanned sheet as delivered by the circle detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetScan {
    /// Identifier of the sheet, usually the scan file stem.
    #[serde(default)]
    pub id: String,
    /// Height of the scanned image in pixels.
    pub image_height: f64,
    /// Detected marks. `None` means the detector found nothing.
    #[serde(default)]
    pub marks: Option<Vec<Mark>>,
}

impl SheetScan {
    pub fn new(id: impl Into<String>, image_height: f64, marks: Option<Vec<Mark>>) -> Self {
        Self {
            id: id.into(),
            image_height,
            marks,
        }
    }

    /// True when there is nothing to assign.
    pub fn has_no_marks(&self) -> bool {
        self.marks.as_ref().is_none_or(|m| m.is_empty())
    }
}
