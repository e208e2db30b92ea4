//! The `bubblegrade grade` command.

use std::path::PathBuf;

use anyhow::Result;

use bubblegrade_core::parser;
use bubblegrade_core::report::{BatchReport, SheetReport};
use bubblegrade_report::html::write_html_report;

pub fn execute(
    exam_path: PathBuf,
    scans_path: PathBuf,
    output: PathBuf,
    format: String,
    verbose: bool,
) -> Result<()> {
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(bad) = formats.iter().find(|f| !matches!(**f, "json" | "html")) {
        anyhow::bail!("unknown format '{bad}' (expected json, html or all)");
    }

    let exam = parser::parse_exam(&exam_path)?;
    let grader = exam.grader()?;

    let scans = if scans_path.is_dir() {
        parser::load_scan_directory(&scans_path)?
    } else {
        vec![parser::parse_scan(&scans_path)?]
    };
    anyhow::ensure!(
        !scans.is_empty(),
        "no scans found in {}",
        scans_path.display()
    );
    tracing::info!(
        exam = %exam.id,
        scans = scans.len(),
        source = %scans_path.display(),
        "loaded scans"
    );

    eprintln!(
        "bubblegrade v{} — Grading {} sheet(s) against '{}' ({} questions)",
        env!("CARGO_PKG_VERSION"),
        scans.len(),
        exam.name,
        exam.layout.question_count
    );
    eprintln!();

    let batch = grader.grade_batch(&scans);
    let report = BatchReport::new(&exam, &batch);

    for sheet in &report.sheets {
        print_sheet(sheet, &report.exam.answer_key, verbose);
    }

    if report.sheets.len() + report.failures.len() > 1 {
        print_summary(&report);
    }

    for failure in &report.failures {
        eprintln!("FAILED: {}: {}", failure.sheet_id, failure.error);
    }

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            other => anyhow::bail!("unknown format '{other}'"),
        }
    }

    if report.sheets.is_empty() {
        anyhow::bail!("none of the {} sheet(s) could be graded", report.failures.len());
    }

    Ok(())
}

fn print_sheet(sheet: &SheetReport, answer_key: &[String], verbose: bool) {
    println!("== {} ==", sheet.sheet_id);
    if verbose {
        println!("Correct Answers (User Input): {answer_key:?}");
        println!("Detected Options (From Optic) : {:?}", sheet.marked_options);
        for label in sheet.labels() {
            println!("{label}");
        }
    }
    println!("Number of correct answers= {}", sheet.tally.correct);
    println!("Number of wrong answers = {}", sheet.tally.wrong);
    println!("Number of unmarked answers = {}", sheet.tally.unmarked);
    println!("Grade: {:.2}", sheet.percentage);
    println!();
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Sheet", "Correct", "Wrong", "Unmarked", "Grade"]);

    for sheet in &report.sheets {
        table.add_row(vec![
            Cell::new(&sheet.sheet_id),
            Cell::new(sheet.tally.correct),
            Cell::new(sheet.tally.wrong),
            Cell::new(sheet.tally.unmarked),
            Cell::new(format!("{:.2}", sheet.percentage)),
        ]);
    }
    for failure in &report.failures {
        table.add_row(vec![
            Cell::new(&failure.sheet_id),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("FAILED"),
        ]);
    }

    eprintln!("{table}");
    eprintln!(
        "Mean grade: {:.2} (min {:.2}, max {:.2})",
        report.aggregate.mean_percentage,
        report.aggregate.min_percentage,
        report.aggregate.max_percentage
    );

    let hardest: Vec<String> = report
        .aggregate
        .hardest_questions()
        .iter()
        .take(3)
        .map(|q| format!("Q{} ({:.0}%)", q.question, q.correct_rate * 100.0))
        .collect();
    if !hardest.is_empty() {
        eprintln!("Hardest questions: {}", hardest.join(", "));
    }
}
