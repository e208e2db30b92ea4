//! bubblegrade-core — Mark-to-grid assignment and answer-sheet grading.
//!
//! This crate turns the unordered circle marks found on a scanned answer
//! sheet into per-question letters, grades them against an answer key, and
//! produces the reports the rest of bubblegrade builds on.

pub mod engine;
pub mod error;
pub mod grading;
pub mod grid;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;

