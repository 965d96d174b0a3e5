//! JSON export loader.
//!
//! Reads the quiz and grade exports written by the fetch step and checks
//! them for problems the statistics engine would otherwise silently absorb.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{GradeBook, GradeRecord, Quiz, QuizDataset};

/// Combined export of every quiz in a section.
pub const ALL_QUIZZES_FILE: &str = "all_quizzes.json";

/// Grade export of a section.
pub const GRADES_FILE: &str = "grades.json";

#[derive(Debug, Deserialize)]
struct GradesFile {
    #[serde(default)]
    enrollments: Vec<GradeRecord>,
}

/// Parse a combined quiz export.
pub fn parse_quiz_dataset_str(content: &str, source_path: &Path) -> Result<QuizDataset> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse quiz data: {}", source_path.display()))
}

/// Parse a grade export into a grade book.
pub fn parse_grades_str(content: &str, source_path: &Path) -> Result<GradeBook> {
    let parsed: GradesFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse grades: {}", source_path.display()))?;
    Ok(GradeBook::from_records(&parsed.enrollments))
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load all quizzes of a section from its raw data directory.
///
/// Prefers `all_quizzes.json`; otherwise reads every `quiz_*.json` file in
/// name order.
pub fn load_quiz_dataset(dir: &Path) -> Result<QuizDataset> {
    if !dir.is_dir() {
        anyhow::bail!(
            "no quiz data found in {} (fetch the section exports first)",
            dir.display()
        );
    }

    let section = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let combined = dir.join(ALL_QUIZZES_FILE);
    if combined.exists() {
        let mut dataset = parse_quiz_dataset_str(&read_file(&combined)?, &combined)?;
        if dataset.section.is_empty() {
            dataset.section = section;
        }
        return Ok(dataset);
    }

    let mut quiz_files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_quiz_file = path.extension().is_some_and(|ext| ext == "json")
            && path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("quiz_"));
        if is_quiz_file {
            quiz_files.push(path);
        }
    }
    quiz_files.sort();

    let mut quizzes = Vec::with_capacity(quiz_files.len());
    for path in &quiz_files {
        let quiz: Quiz = serde_json::from_str(&read_file(path)?)
            .with_context(|| format!("failed to parse quiz file: {}", path.display()))?;
        quizzes.push(quiz);
    }

    tracing::debug!("loaded {} quiz files from {}", quizzes.len(), dir.display());
    Ok(QuizDataset { section, quizzes })
}

/// Load the grade book of a section. A missing grade export yields an empty book.
pub fn load_grade_book(dir: &Path) -> Result<GradeBook> {
    let path = dir.join(GRADES_FILE);
    if !path.exists() {
        tracing::warn!(
            "no grades found at {}; discrimination and correlation will be unavailable",
            path.display()
        );
        return Ok(GradeBook::new());
    }
    parse_grades_str(&read_file(&path)?, &path)
}

/// A warning from dataset validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub quiz_id: Option<u64>,
    pub question_id: Option<u64>,
    pub message: String,
}

/// Validate a dataset for problems that would distort item statistics.
pub fn validate_dataset(dataset: &QuizDataset) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut seen_quizzes = HashSet::new();

    for quiz in &dataset.quizzes {
        if !seen_quizzes.insert(quiz.quiz_id) {
            warnings.push(ValidationWarning {
                quiz_id: Some(quiz.quiz_id),
                question_id: None,
                message: format!("duplicate quiz ID: {}", quiz.quiz_id),
            });
        }
        warnings.extend(validate_quiz(quiz));
    }

    warnings
}

fn validate_quiz(quiz: &Quiz) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |question_id: Option<u64>, message: String| ValidationWarning {
        quiz_id: Some(quiz.quiz_id),
        question_id,
        message,
    };

    if quiz.submissions.is_empty() {
        warnings.push(warn(None, "quiz has no submissions".into()));
    }

    // Duplicate question IDs
    let mut seen = HashSet::new();
    for q in &quiz.questions {
        if !seen.insert(q.id) {
            warnings.push(warn(Some(q.id), format!("duplicate question ID: {}", q.id)));
        }
    }

    // Exactly one keyed answer per question
    for q in &quiz.questions {
        if q.answers.is_empty() {
            continue;
        }
        match q.correct_answer_ids().len() {
            1 => {}
            0 => warnings.push(warn(Some(q.id), "no answer is weighted as correct".into())),
            n => warnings.push(warn(
                Some(q.id),
                format!("{n} answers are weighted as correct"),
            )),
        }
    }

    // Responses to unknown questions or unknown answers
    let mut unknown_questions = HashSet::new();
    let mut unknown_answers = HashSet::new();
    for sub in &quiz.submissions {
        for (key, resp) in &sub.responses {
            let question = key
                .parse::<u64>()
                .ok()
                .and_then(|id| quiz.questions.iter().find(|q| q.id == id));
            match question {
                None => {
                    unknown_questions.insert(key.clone());
                }
                Some(q) => {
                    if let Some(answer_id) = resp.answer_id {
                        if !q.answers.is_empty() && q.answers.iter().all(|a| a.id != answer_id) {
                            unknown_answers.insert((q.id, answer_id));
                        }
                    }
                }
            }
        }
    }

    let mut unknown_questions: Vec<_> = unknown_questions.into_iter().collect();
    unknown_questions.sort();
    for key in unknown_questions {
        warnings.push(warn(None, format!("responses reference unknown question {key}")));
    }

    let mut unknown_answers: Vec<_> = unknown_answers.into_iter().collect();
    unknown_answers.sort();
    for (question_id, answer_id) in unknown_answers {
        warnings.push(warn(
            Some(question_id),
            format!("responses reference unknown answer {answer_id}"),
        ));
    }

    warnings
}
