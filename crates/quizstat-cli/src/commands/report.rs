//! The `quizstat report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizstat_core::config::{load_config_from, AnalysisConfig};
use quizstat_core::report::SectionAnalysis;
use quizstat_report::html::write_dashboard;
use quizstat_report::markdown::{write_flagged_summary, write_quiz_reports};

use super::resolve_sections;

pub fn execute(section: Option<String>, all: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let sections = resolve_sections(section, all, &config)?;

    for section in &sections {
        let path = config.paths.analysis_file(section);
        let analysis = SectionAnalysis::load_json(&path).with_context(|| {
            format!("no saved analysis for {section} (run `quizstat analyze {section}` first)")
        })?;
        render_reports(&analysis, &config)?;
    }

    Ok(())
}

/// Write per-quiz Markdown reports, the flagged summary, and the dashboard.
pub fn render_reports(analysis: &SectionAnalysis, config: &AnalysisConfig) -> Result<()> {
    let section = analysis.section.as_str();

    let written = write_quiz_reports(analysis, &config.paths.report_dir(section))?;
    eprintln!(
        "Quiz reports: {} written to {}",
        written.len(),
        config.paths.report_dir(section).display()
    );

    let flagged = config.paths.flagged_file(section);
    write_flagged_summary(analysis, &flagged)?;
    eprintln!("Flagged summary: {}", flagged.display());

    let dashboard = config.paths.dashboard_file(section);
    write_dashboard(analysis, config.semester(section), &dashboard)?;
    eprintln!("Dashboard: {}", dashboard.display());

    Ok(())
}
