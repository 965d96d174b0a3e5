//! The `quizstat init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizstat.toml").exists() {
        println!("quizstat.toml already exists, skipping.");
    } else {
        std::fs::write("quizstat.toml", SAMPLE_CONFIG)?;
        println!("Created quizstat.toml");
    }

    std::fs::create_dir_all("data/raw")?;

    println!("\nNext steps:");
    println!("  1. Add your course sections under [courses] in quizstat.toml");
    println!("  2. Place quiz exports in data/raw/<section>/all_quizzes.json and grades.json");
    println!("  3. Run: quizstat validate <section>");
    println!("  4. Run: quizstat analyze <section> --full");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizstat configuration

[thresholds.difficulty]
too_easy = 0.90
too_hard = 0.30

[thresholds.discrimination]
critical = 0.0
flag_below = 0.20

[thresholds.point_biserial]
flag_below = 0.20

[grouping]
# top_bottom_27 | thirds | median
method = "top_bottom_27"

[paths]
raw_data = "data/raw"
processed = "data/processed"
reports = "reports"
dashboards = "dashboards"
flagged = "reports/flagged"

# [courses.spring2026_001]
# name = "PSYC 2075 - Section 001"
# semester = "Spring 2026"
"#;
