//! Section analysis driver.
//!
//! Runs the statistics engine over every question of every quiz in a
//! section. Questions are independent: absent metrics on one question never
//! stop the others from being analyzed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AnalysisConfig, Grouping, Thresholds};
use crate::evaluate::{evaluate_metrics, Evaluation, Severity};
use crate::model::{GradeBook, Question, QuestionId, Quiz, QuizDataset};
use crate::report::SectionAnalysis;
use crate::statistics::{
    difficulty, discrimination, distractor_analysis, point_biserial, Discrimination,
    DistractorAnalysis, PointBiserial, ScoreSummary,
};

/// Question text is kept to this many characters in analysis output.
pub const QUESTION_TEXT_LEN: usize = 200;

/// Metrics and evaluation for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub question_id: QuestionId,
    pub position: u32,
    pub text: String,
    pub difficulty: Option<f64>,
    pub discrimination: Option<Discrimination>,
    pub distractor_analysis: Option<DistractorAnalysis>,
    pub point_biserial: Option<PointBiserial>,
    pub evaluation: Evaluation,
}

/// Quiz-level summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    /// Distribution of submission scores, when any submission was graded.
    #[serde(default)]
    pub scores: Option<ScoreSummary>,
    #[serde(default)]
    pub total_flags: usize,
    /// Number of questions whose severity is critical.
    #[serde(default)]
    pub critical_flags: usize,
    #[serde(default)]
    pub questions_analyzed: usize,
    /// Why the quiz could not be analyzed, if it could not.
    #[serde(default)]
    pub error: Option<String>,
}

/// Item analysis of one quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnalysis {
    pub quiz_id: u64,
    pub title: String,
    pub question_count: usize,
    pub submission_count: usize,
    /// Questions ordered by position.
    pub questions: Vec<QuestionAnalysis>,
    pub summary: QuizSummary,
}

/// Thresholds and grouping used to produce an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub thresholds: Thresholds,
    pub grouping: Grouping,
}

impl From<&AnalysisConfig> for AnalysisSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            grouping: config.grouping,
        }
    }
}

/// Compute every metric for one question and evaluate them.
pub fn analyze_question(
    question: &Question,
    quiz: &Quiz,
    grades: &GradeBook,
    settings: &AnalysisSettings,
) -> QuestionAnalysis {
    let responses = quiz.responses_for(question.id);

    let difficulty = difficulty(&responses);
    let discrimination = discrimination(&responses, grades, settings.grouping.method);
    let distractor_analysis = distractor_analysis(&responses, question);
    let point_biserial = point_biserial(&responses, grades);

    let evaluation = evaluate_metrics(
        difficulty,
        discrimination.as_ref(),
        point_biserial.as_ref(),
        &settings.thresholds,
    );

    tracing::debug!(
        question_id = question.id,
        responses = responses.len(),
        severity = %evaluation.severity,
        "analyzed question"
    );

    QuestionAnalysis {
        question_id: question.id,
        position: question.position,
        text: question.text.chars().take(QUESTION_TEXT_LEN).collect(),
        difficulty,
        discrimination,
        distractor_analysis,
        point_biserial,
        evaluation,
    }
}

/// Analyze one quiz.
pub fn analyze_quiz(quiz: &Quiz, grades: &GradeBook, settings: &AnalysisSettings) -> QuizAnalysis {
    let mut result = QuizAnalysis {
        quiz_id: quiz.quiz_id,
        title: quiz.title.clone(),
        question_count: quiz.questions.len(),
        submission_count: quiz.submissions.len(),
        questions: Vec::new(),
        summary: QuizSummary::default(),
    };

    if quiz.submissions.is_empty() || quiz.questions.is_empty() {
        tracing::warn!(quiz_id = quiz.quiz_id, "no submission or question data for '{}'", quiz.title);
        result.summary.error = Some("No submission or question data available".into());
        return result;
    }

    result.summary.scores = ScoreSummary::from_scores(&quiz.scores(), quiz.points_possible);

    let mut questions: Vec<QuestionAnalysis> = quiz
        .questions
        .iter()
        .map(|q| analyze_question(q, quiz, grades, settings))
        .collect();
    questions.sort_by_key(|q| q.position);

    result.summary.total_flags = questions.iter().map(|q| q.evaluation.flag_count).sum();
    result.summary.critical_flags = questions
        .iter()
        .filter(|q| q.evaluation.severity == Severity::Critical)
        .count();
    result.summary.questions_analyzed = questions.len();
    result.questions = questions;

    result
}

/// Analyze every quiz of a section.
pub fn analyze_section(
    dataset: &QuizDataset,
    grades: &GradeBook,
    config: &AnalysisConfig,
) -> SectionAnalysis {
    let settings = AnalysisSettings::from(config);

    tracing::info!(
        section = %dataset.section,
        quizzes = dataset.quizzes.len(),
        graded_students = grades.len(),
        grouping = %settings.grouping.method,
        "analyzing section"
    );
    if grades.is_empty() {
        tracing::warn!("no grades data; discrimination and correlation analysis limited");
    }

    let quizzes: Vec<QuizAnalysis> = dataset
        .quizzes
        .iter()
        .map(|quiz| {
            let analysis = analyze_quiz(quiz, grades, &settings);
            tracing::info!(
                "analyzed: {} - {} flags",
                analysis.title,
                analysis.summary.total_flags
            );
            analysis
        })
        .collect();

    SectionAnalysis {
        id: Uuid::new_v4(),
        section: dataset.section.clone(),
        analyzed_at: Utc::now(),
        config: settings,
        quizzes,
    }
}
