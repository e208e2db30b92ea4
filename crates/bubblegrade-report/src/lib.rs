//! bubblegrade-report — HTML reports for graded answer sheets.

pub mod html;
