//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined. Each sheet
//! gets an SVG overlay that draws its paint instructions as circles.

use anyhow::Result;
use std::path::Path;

use bubblegrade_core::grading::{PaintColor, Verdict};
use bubblegrade_core::report::{BatchReport, SheetReport};
use bubblegrade_core::statistics::QuestionStats;

const GREEN: &str = "#22c55e";
const YELLOW: &str = "#eab308";
const RED: &str = "#ef4444";

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn paint_color(color: PaintColor) -> &'static str {
    match color {
        PaintColor::Correct => GREEN,
        PaintColor::Wrong => RED,
        PaintColor::Partial => YELLOW,
    }
}

fn verdict_class(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::True => "pass",
        Verdict::False => "fail",
        Verdict::PartialGrade => "partial",
        Verdict::Unmarked => "",
    }
}

/// Generate an HTML report from a batch report.
pub fn generate_html(report: &BatchReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>bubblegrade report — {}</title>\n",
        html_escape(&report.exam.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>bubblegrade report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Exam: <strong>{}</strong> | {} questions | {} sheets | {}</p>\n",
        html_escape(&report.exam.name),
        report.exam.question_count,
        report.sheets.len() + report.failures.len(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !report.exam.description.is_empty() {
        html.push_str(&format!(
            "<p class=\"meta\">{}</p>\n",
            html_escape(&report.exam.description)
        ));
    }
    html.push_str(&format!(
        "<p class=\"meta\">Answer key: <code>{}</code>{}</p>\n",
        html_escape(&report.exam.answer_key.join(" ")),
        if report.exam.partial_credit {
            " | partial credit"
        } else {
            ""
        }
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p>Mean grade <strong>{:.2}</strong> (min {:.2}, max {:.2})</p>\n",
        report.aggregate.mean_percentage,
        report.aggregate.min_percentage,
        report.aggregate.max_percentage
    ));

    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Sheet</th><th onclick=\"sortTable(1)\">Correct</th><th onclick=\"sortTable(2)\">Wrong</th><th onclick=\"sortTable(3)\">Unmarked</th><th onclick=\"sortTable(4)\">Grade</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &report.sheets {
        html.push_str(&format!(
            "<tr><td><a href=\"#sheet-{id}\">{id}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
            s.tally.correct,
            s.tally.wrong,
            s.tally.unmarked,
            s.percentage,
            id = html_escape(&s.sheet_id),
        ));
    }
    for f in &report.failures {
        html.push_str(&format!(
            "<tr class=\"fail\"><td>{}</td><td colspan=\"4\">{}</td></tr>\n",
            html_escape(&f.sheet_id),
            html_escape(&f.error)
        ));
    }
    html.push_str("</tbody></table>\n");

    if report.aggregate.sheet_count > 0 {
        html.push_str("<h3>Correct rate per question</h3>\n");
        html.push_str(&generate_bar_chart(&report.aggregate.per_question));
    }

    html.push_str("</section>\n");

    // Per-sheet results
    html.push_str("<section class=\"sheets\">\n");
    html.push_str("<h2>Sheets</h2>\n");
    for s in &report.sheets {
        html.push_str(&sheet_section(s));
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &BatchReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn sheet_section(sheet: &SheetReport) -> String {
    let mut html = format!(
        "<article class=\"sheet\" id=\"sheet-{}\">\n<h3>{}: {:.2}</h3>\n<div class=\"sheet-body\">\n",
        html_escape(&sheet.sheet_id),
        html_escape(&sheet.sheet_id),
        sheet.percentage
    );

    html.push_str(&generate_overlay(sheet));

    html.push_str("<table class=\"verdicts\">\n");
    html.push_str("<thead><tr><th>Question</th><th>Marked</th><th>Key</th><th>Verdict</th></tr></thead>\n<tbody>\n");
    for v in &sheet.verdicts {
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            verdict_class(v.verdict),
            v.question,
            html_escape(&v.marked),
            html_escape(&v.expected),
            v.verdict
        ));
    }
    html.push_str("</tbody></table>\n</div>\n</article>\n");
    html
}

/// Draw the painted and stray marks of a sheet at their image positions.
fn generate_overlay(sheet: &SheetReport) -> String {
    let margin = 20.0;
    let (width, height) = sheet
        .paint
        .iter()
        .map(|p| p.mark)
        .chain(sheet.stray_marks.iter().copied())
        .fold((0.0f64, 0.0f64), |(w, h), m| {
            (w.max(m.x + m.radius), h.max(m.y + m.radius))
        });

    if width <= 0.0 || height <= 0.0 {
        return "<p class=\"meta\">No marks detected.</p>\n".to_string();
    }

    let mut svg = format!(
        "<svg class=\"overlay\" viewBox=\"0 0 {:.0} {:.0}\" width=\"{:.0}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        width + margin,
        height + margin,
        ((width + margin) / 2.0).max(160.0)
    );

    for p in &sheet.paint {
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"><title>Q{}</title></circle>\n",
            p.mark.x,
            p.mark.y,
            p.mark.radius,
            paint_color(p.color),
            p.question
        ));
    }
    for m in &sheet.stray_marks {
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"none\" stroke=\"#9ca3af\" stroke-dasharray=\"3 2\"/>\n",
            m.x, m.y, m.radius
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn generate_bar_chart(per_question: &[QuestionStats]) -> String {
    let bar_height = 20;
    let max_width = 400;
    let padding = 6;
    let label_width = 60;

    let total_height = per_question.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, q) in per_question.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let rate = q.correct_rate.clamp(0.0, 1.0);
        let width = (rate * max_width as f64) as usize;

        let color = if rate >= 0.8 {
            GREEN
        } else if rate >= 0.5 {
            YELLOW
        } else {
            RED
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"13\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">Q{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            q.question
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"3\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            rate * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --partial: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --partial: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.partial { background: var(--partial); }
.sheet-body { display: flex; gap: 2rem; align-items: flex-start; }
.overlay { border: 1px solid var(--border); border-radius: 8px; flex: none; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = isNaN(na) || isNaN(nb) ? va.localeCompare(vb) : na - nb;
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
