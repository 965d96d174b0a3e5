//! The `quizstat analyze` command.

use std::path::PathBuf;

use anyhow::Result;

use quizstat_core::analysis::analyze_section;
use quizstat_core::config::{load_config_from, AnalysisConfig};
use quizstat_core::loader::{load_grade_book, load_quiz_dataset};
use quizstat_core::report::SectionAnalysis;

use super::report::render_reports;
use super::resolve_sections;

pub fn execute(
    section: Option<String>,
    all: bool,
    full: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let sections = resolve_sections(section, all, &config)?;

    for section in &sections {
        let analysis = analyze(section, &config)?;
        print_summary(&analysis);

        if full {
            render_reports(&analysis, &config)?;
        }
    }

    Ok(())
}

fn analyze(section: &str, config: &AnalysisConfig) -> Result<SectionAnalysis> {
    let raw_dir = config.paths.raw_dir(section);
    let mut dataset = load_quiz_dataset(&raw_dir)?;
    dataset.section = section.to_string();
    let grades = load_grade_book(&raw_dir)?;

    eprintln!(
        "Analyzing {section}: {} quizzes, {} graded students",
        dataset.quizzes.len(),
        grades.len()
    );

    let analysis = analyze_section(&dataset, &grades, config);

    let path = config.paths.analysis_file(section);
    analysis.save_json(&path)?;
    eprintln!("Analysis saved to: {}", path.display());

    Ok(analysis)
}

fn print_summary(analysis: &SectionAnalysis) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Quiz",
        "Submissions",
        "Questions",
        "Mean",
        "Flags",
        "Critical",
    ]);

    for quiz in &analysis.quizzes {
        let mean = quiz
            .summary
            .scores
            .as_ref()
            .and_then(|s| s.mean_fraction())
            .map(|m| format!("{:.1}%", m * 100.0))
            .unwrap_or_else(|| "N/A".to_string());
        table.add_row(vec![
            Cell::new(&quiz.title),
            Cell::new(quiz.submission_count),
            Cell::new(quiz.summary.questions_analyzed),
            Cell::new(mean),
            Cell::new(quiz.summary.total_flags),
            Cell::new(quiz.summary.critical_flags),
        ]);
    }

    println!("\n{table}");
    println!(
        "{}: {} questions, {} flags, {} critical",
        analysis.section,
        analysis.total_questions(),
        analysis.total_flags(),
        analysis.critical_count()
    );
}
