//! Core data model types for quizstat.
//!
//! These mirror the JSON exports produced by the quiz fetch step: quizzes
//! with their questions and per-student submissions, plus the course grade
//! records used as the external criterion for discrimination and correlation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Weight the LMS assigns to the correct answer option.
pub const CORRECT_WEIGHT: f64 = 100.0;

/// Identifier of a question within the LMS.
pub type QuestionId = u64;

/// Identifier of an answer option within the LMS.
pub type AnswerId = u64;

/// One student's answer to one question, as consumed by the statistics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Anonymized student identifier.
    pub student_id: String,
    /// The selected answer option, if the LMS recorded one.
    pub answer_id: Option<AnswerId>,
    /// Whether the LMS graded this response as correct.
    pub correct: bool,
}

impl ResponseRecord {
    pub fn new(student_id: impl Into<String>, answer_id: Option<AnswerId>, correct: bool) -> Self {
        Self {
            student_id: student_id.into(),
            answer_id,
            correct,
        }
    }
}

/// A single answer option of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    #[serde(default)]
    pub text: String,
    /// 100 marks the correct option; anything else is a distractor.
    #[serde(default)]
    pub weight: f64,
}

impl Answer {
    /// Returns `true` if this option is the keyed answer.
    pub fn is_correct(&self) -> bool {
        self.weight == CORRECT_WEIGHT
    }
}

/// A quiz question with its ordered answer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Position within the quiz (1-based in LMS exports).
    #[serde(default)]
    pub position: u32,
    /// Question text, possibly containing HTML markup.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub points: Option<f64>,
    /// Answer options in declaration order.
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Question {
    /// The ids of all options weighted as correct.
    pub fn correct_answer_ids(&self) -> Vec<AnswerId> {
        self.answers
            .iter()
            .filter(|a| a.is_correct())
            .map(|a| a.id)
            .collect()
    }
}

/// A student's response to a single question inside a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    #[serde(default)]
    pub answer_id: Option<AnswerId>,
    #[serde(default)]
    pub correct: bool,
}

/// One student's quiz submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: String,
    /// Score awarded for the whole quiz, if graded.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default = "default_attempt")]
    pub attempt: u32,
    /// Responses keyed by the question id rendered as a string.
    #[serde(default)]
    pub responses: HashMap<String, QuestionResponse>,
}

fn default_attempt() -> u32 {
    1
}

impl Submission {
    /// The response to the given question, if this submission has one.
    pub fn response_to(&self, question_id: QuestionId) -> Option<&QuestionResponse> {
        self.responses.get(&question_id.to_string())
    }
}

/// A quiz with its questions and submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_points_possible")]
    pub points_possible: f64,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

fn default_points_possible() -> f64 {
    50.0
}

impl Quiz {
    /// Project every submission that answered `question_id` into a response record.
    pub fn responses_for(&self, question_id: QuestionId) -> Vec<ResponseRecord> {
        self.submissions
            .iter()
            .filter_map(|s| {
                s.response_to(question_id).map(|r| ResponseRecord {
                    student_id: s.student_id.clone(),
                    answer_id: r.answer_id,
                    correct: r.correct,
                })
            })
            .collect()
    }

    /// Scores of all graded submissions.
    pub fn scores(&self) -> Vec<f64> {
        self.submissions.iter().filter_map(|s| s.score).collect()
    }
}

/// All quizzes exported for one course section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizDataset {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

/// One student's course grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRecord {
    pub student_id: String,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub current_score: Option<f64>,
}

impl GradeRecord {
    /// The final score when available, otherwise the current score.
    pub fn score(&self) -> Option<f64> {
        self.final_score.or(self.current_score)
    }
}

/// Lookup of course grade percentage by student id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeBook {
    grades: HashMap<String, f64>,
}

impl GradeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grade book, skipping students with neither a final nor a current score.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a GradeRecord>) -> Self {
        let grades = records
            .into_iter()
            .filter_map(|r| r.score().map(|s| (r.student_id.clone(), s)))
            .collect();
        Self { grades }
    }

    pub fn insert(&mut self, student_id: impl Into<String>, grade: f64) {
        self.grades.insert(student_id.into(), grade);
    }

    pub fn get(&self, student_id: &str) -> Option<f64> {
        self.grades.get(student_id).copied()
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }
}

impl FromIterator<(String, f64)> for GradeBook {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            grades: iter.into_iter().collect(),
        }
    }
}
