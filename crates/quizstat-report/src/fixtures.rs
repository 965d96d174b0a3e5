//! Shared test fixtures: a small analyzed section.

use std::collections::HashMap;

use quizstat_core::analysis::analyze_section;
use quizstat_core::config::AnalysisConfig;
use quizstat_core::model::{
    Answer, GradeBook, Question, QuestionResponse, Quiz, QuizDataset, Submission,
};
use quizstat_core::report::SectionAnalysis;

fn question(id: u64, position: u32, text: &str) -> Question {
    Question {
        id,
        position,
        text: text.into(),
        question_type: "multiple_choice_question".into(),
        points: Some(1.0),
        answers: vec![
            Answer { id: id * 10, text: "Correct answer".into(), weight: 100.0 },
            Answer { id: id * 10 + 1, text: "Plausible distractor".into(), weight: 0.0 },
            Answer { id: id * 10 + 2, text: "Weak distractor".into(), weight: 0.0 },
        ],
    }
}

/// Section with one quiz holding a strong, a reversed, and an easy item, plus
/// an empty quiz whose title needs escaping.
pub fn section_analysis() -> SectionAnalysis {
    let mut grades = GradeBook::new();
    let mut submissions = Vec::new();
    for i in 0..15u64 {
        let student_id = format!("student_{i:03}");
        grades.insert(student_id.clone(), 98.0 - 2.0 * i as f64);

        let mut responses = HashMap::new();
        let strong = i < 7;
        responses.insert(
            "1".to_string(),
            QuestionResponse { answer_id: Some(if strong { 10 } else { 11 }), correct: strong },
        );
        let reversed = i >= 9;
        responses.insert(
            "2".to_string(),
            QuestionResponse { answer_id: Some(if reversed { 20 } else { 22 }), correct: reversed },
        );
        responses.insert(
            "3".to_string(),
            QuestionResponse { answer_id: Some(30), correct: true },
        );
        submissions.push(Submission {
            student_id,
            score: Some(50.0 - i as f64),
            attempt: 1,
            responses,
        });
    }

    let dataset = QuizDataset {
        section: "spring2026_001".into(),
        quizzes: vec![
            Quiz {
                quiz_id: 101,
                title: "Week 2 Quiz".into(),
                points_possible: 50.0,
                questions: vec![
                    question(1, 1, "<p>Which <b>memory</b> system is implicated?</p>"),
                    question(2, 2, "Pick the best diagnosis"),
                    question(3, 3, "What is the course number?"),
                ],
                submissions,
            },
            Quiz {
                quiz_id: 102,
                title: "Unreleased <draft>".into(),
                points_possible: 10.0,
                questions: vec![],
                submissions: vec![],
            },
        ],
    };

    let mut analysis = analyze_section(&dataset, &grades, &AnalysisConfig::default());
    analysis.id = uuid::Uuid::nil();
    analysis
}
