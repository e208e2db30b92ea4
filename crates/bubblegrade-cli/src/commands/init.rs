//! The `bubblegrade init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("exams/example.toml"), EXAMPLE_EXAM)?;
    write_if_missing(Path::new("scans/example.json"), EXAMPLE_SCAN)?;

    println!("\nNext steps:");
    println!("  1. Edit exams/example.toml with your answer key");
    println!("  2. Run: bubblegrade validate --exam exams/example.toml");
    println!("  3. Run: bubblegrade grade --exam exams/example.toml --scans scans");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("Created {}", path.display());
    Ok(())
}

const EXAMPLE_EXAM: &str = r#"# One entry per question. Two letters mark a question with two correct answers.
answer_key = ["A", "C", "BD", "D", "B"]

[exam]
id = "example"
name = "Example Quiz"
description = "A five question quiz to get started"
choice_count = 4
partial_credit = true

# Pin the x positions of the first and last answer columns so sheets with
# few marks still classify correctly.
[layout]
first_column_x = 100.0
last_column_x = 250.0
"#;

const EXAMPLE_SCAN: &str = r#"{
  "id": "student-001",
  "image_height": 500.0,
  "marks": [
    { "x": 101.0, "y": 48.0, "radius": 11.0 },
    { "x": 199.0, "y": 152.0, "radius": 11.0 },
    { "x": 150.0, "y": 249.0, "radius": 12.0 },
    { "x": 248.0, "y": 351.0, "radius": 11.0 },
    { "x": 152.0, "y": 447.0, "radius": 10.0 }
  ]
}
"#;
