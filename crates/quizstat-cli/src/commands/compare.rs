//! The `quizstat compare` command.

use std::path::PathBuf;

use anyhow::Result;

use quizstat_core::report::SectionAnalysis;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    format: String,
    fail_on_escalation: bool,
) -> Result<()> {
    let baseline = SectionAnalysis::load_json(&baseline_path)?;
    let current = SectionAnalysis::load_json(&current_path)?;

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} escalations, {} resolutions, {} unchanged",
                report.escalations.len(),
                report.resolutions.len(),
                report.unchanged
            );

            for (heading, changes) in [
                ("Escalations", &report.escalations),
                ("Resolutions", &report.resolutions),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{heading}:");
                for c in changes {
                    println!(
                        "  {} question {}: {} -> {}",
                        c.quiz_title, c.question_id, c.baseline, c.current
                    );
                }
            }

            if report.new_questions > 0 {
                println!("\n{} new question(s)", report.new_questions);
            }
            if report.removed_questions > 0 {
                println!("{} removed question(s)", report.removed_questions);
            }
        }
    }

    if fail_on_escalation && report.has_escalations() {
        std::process::exit(1);
    }

    Ok(())
}
