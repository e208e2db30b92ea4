//! Grading error types.
//!
//! Configuration errors are raised before any sheet is processed, except
//! for a zero column spread which depends on the detected marks. Detection
//! inconsistencies surface while grading a single sheet and only fail that
//! sheet.

use thiserror::Error;

/// Errors that can occur while assigning marks or grading a sheet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    /// The layout has no questions.
    #[error("question count must be at least 1")]
    NoQuestions,

    /// Fewer than two choices leaves the column width undefined.
    #[error("choice count must be at least 2, got {0}")]
    TooFewChoices(usize),

    /// More choices than there are letters.
    #[error("choice count must be at most 26, got {0}")]
    TooManyChoices(usize),

    /// The image height cannot be split into question rows.
    #[error("image height must be a positive number, got {0}")]
    InvalidImageHeight(f64),

    /// A pinned column span that is empty or reversed.
    #[error("invalid column span: first column at x={first_x}, last at x={last_x}")]
    InvalidColumnSpan { first_x: f64, last_x: f64 },

    /// Every mark shares one x position, so columns cannot be told apart.
    #[error("cannot separate choice columns: all marks share x={x}")]
    ZeroColumnSpread { x: f64 },

    /// The answer key does not have one entry per question.
    #[error("answer key has {actual} entries, expected {expected}")]
    AnswerKeyLength { expected: usize, actual: usize },

    /// An answer key entry that is not one or two letters.
    #[error("question {question}: answer key entries must have 1 or 2 letters, got {len}")]
    AnswerKeyCardinality { question: usize, len: usize },

    /// An answer key entry that could not be parsed.
    #[error("question {question}: {reason}")]
    AnswerKeyEntry { question: usize, reason: String },

    /// An answer key letter outside the layout's columns.
    #[error("question {question}: letter {letter} is outside the {choice_count} available choices")]
    AnswerKeyLetter {
        question: usize,
        letter: char,
        choice_count: usize,
    },

    /// The same letter listed twice in one answer key entry.
    #[error("question {question}: letter {letter} is listed twice")]
    DuplicateAnswerLetter { question: usize, letter: char },

    /// Grading needed more marks than assignment produced.
    #[error("question {question} needs {needed} mark(s) but only {available} remain")]
    MarksExhausted {
        question: usize,
        needed: usize,
        available: usize,
    },
}

impl GradingError {
    /// Returns `true` if the error comes from the grid configuration or the
    /// answer key.
    pub fn is_configuration(&self) -> bool {
        !self.is_detection_inconsistency()
    }

    /// Returns `true` if the error is specific to one sheet's detected marks.
    pub fn is_detection_inconsistency(&self) -> bool {
        matches!(self, GradingError::MarksExhausted { .. })
    }
}
