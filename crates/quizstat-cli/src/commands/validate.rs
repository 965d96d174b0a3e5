//! The `quizstat validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizstat_core::config::load_config_from;
use quizstat_core::loader::{load_grade_book, load_quiz_dataset, validate_dataset};

pub fn execute(section: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let raw_dir = config.paths.raw_dir(&section);

    let dataset = load_quiz_dataset(&raw_dir)?;
    let grades = load_grade_book(&raw_dir)?;

    let question_count: usize = dataset.quizzes.iter().map(|q| q.questions.len()).sum();
    println!(
        "Section: {section} ({} quizzes, {question_count} questions, {} graded students)",
        dataset.quizzes.len(),
        grades.len()
    );

    let warnings = validate_dataset(&dataset);
    for w in &warnings {
        let prefix = match (w.quiz_id, w.question_id) {
            (Some(quiz), Some(question)) => format!("  [quiz {quiz} / question {question}]"),
            (Some(quiz), None) => format!("  [quiz {quiz}]"),
            _ => "  ".to_string(),
        };
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Section data valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
