//! Classical item-analysis statistics.
//!
//! Every function here is a pure computation over a fully materialized slice
//! of response records for a single question. `None` means "not enough data
//! to say anything" and is deliberately distinct from a computed zero.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{AnswerId, GradeBook, Question, ResponseRecord};

/// Minimum number of graded respondents before a discrimination index is reported.
pub const MIN_DISCRIMINATION_SAMPLE: usize = 10;

/// Minimum size of each partition before a point-biserial correlation is reported.
pub const MIN_POINT_BISERIAL_GROUP: usize = 2;

/// Answer text longer than this is truncated in distractor output.
pub const ANSWER_TEXT_DISPLAY_LEN: usize = 50;

/// How the upper and lower performance groups are carved out of the ranked population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingMethod {
    /// Top and bottom 27%, rounded up, at least one student.
    #[default]
    #[serde(rename = "top_bottom_27")]
    TopBottom27,
    /// Top and bottom thirds, rounded down.
    #[serde(rename = "thirds")]
    Thirds,
    /// Top and bottom halves, rounded down.
    #[serde(rename = "median")]
    Median,
}

impl GroupingMethod {
    /// Size of each group for a ranked population of `n` students.
    pub fn group_size(self, n: usize) -> usize {
        match self {
            // ceil(0.27 n) in integer arithmetic, so 100 students give exactly 27.
            GroupingMethod::TopBottom27 => ((n * 27).div_ceil(100)).max(1),
            GroupingMethod::Thirds => n / 3,
            GroupingMethod::Median => n / 2,
        }
    }

    /// Short human label for the group, e.g. "27%".
    pub fn group_label(self) -> &'static str {
        match self {
            GroupingMethod::TopBottom27 => "27%",
            GroupingMethod::Thirds => "third",
            GroupingMethod::Median => "half",
        }
    }
}

impl fmt::Display for GroupingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingMethod::TopBottom27 => write!(f, "top_bottom_27"),
            GroupingMethod::Thirds => write!(f, "thirds"),
            GroupingMethod::Median => write!(f, "median"),
        }
    }
}

impl FromStr for GroupingMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top_bottom_27" | "27" => Ok(GroupingMethod::TopBottom27),
            "thirds" => Ok(GroupingMethod::Thirds),
            "median" | "halves" => Ok(GroupingMethod::Median),
            other => Err(ConfigError::UnknownGroupingMethod(other.to_string())),
        }
    }
}

/// Item difficulty (p-value): the proportion of respondents answering correctly.
///
/// Returns `None` when nobody answered, which is not the same as `Some(0.0)`
/// (everybody answered and everybody was wrong).
pub fn difficulty(responses: &[ResponseRecord]) -> Option<f64> {
    if responses.is_empty() {
        return None;
    }
    let correct = responses.iter().filter(|r| r.correct).count();
    Some(correct as f64 / responses.len() as f64)
}

/// Upper/lower group discrimination index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrimination {
    /// D = p_upper - p_lower.
    #[serde(rename = "D")]
    pub d: f64,
    /// Proportion correct in the upper group.
    pub p_upper: f64,
    /// Proportion correct in the lower group.
    pub p_lower: f64,
    pub upper_n: usize,
    pub lower_n: usize,
}

#[derive(Debug, Clone, Copy)]
struct GradedResponse {
    grade: f64,
    correct: bool,
}

/// Responses from students who also have a course grade, in input order.
fn graded_responses(responses: &[ResponseRecord], grades: &GradeBook) -> Vec<GradedResponse> {
    responses
        .iter()
        .filter_map(|r| {
            grades.get(&r.student_id).map(|grade| GradedResponse {
                grade,
                correct: r.correct,
            })
        })
        .collect()
}

fn proportion_correct(group: &[GradedResponse]) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    group.iter().filter(|g| g.correct).count() as f64 / group.len() as f64
}

/// Compute the discrimination index for one question.
///
/// Only students who answered the question and have a known course grade
/// take part. Fewer than [`MIN_DISCRIMINATION_SAMPLE`] of them yields `None`.
/// The upper group is the first `g` students by descending grade and the
/// lower group is the last `g` entries of the same ranking.
pub fn discrimination(
    responses: &[ResponseRecord],
    grades: &GradeBook,
    method: GroupingMethod,
) -> Option<Discrimination> {
    let mut ranked = graded_responses(responses, grades);
    if ranked.len() < MIN_DISCRIMINATION_SAMPLE {
        return None;
    }

    ranked.sort_by(|a, b| b.grade.total_cmp(&a.grade));

    let n = ranked.len();
    let group_size = method.group_size(n).min(n);
    let upper = &ranked[..group_size];
    let lower = &ranked[n - group_size..];

    let p_upper = proportion_correct(upper);
    let p_lower = proportion_correct(lower);

    Some(Discrimination {
        d: p_upper - p_lower,
        p_upper,
        p_lower,
        upper_n: upper.len(),
        lower_n: lower.len(),
    })
}

/// Selection statistics for one answer option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerBreakdown {
    pub answer_id: AnswerId,
    /// Display letter by declaration order: A, B, C, ...
    pub letter: String,
    /// Answer text, truncated for display.
    pub text: String,
    pub is_correct: bool,
    pub count: usize,
    /// count / total_responses.
    pub selection_rate: f64,
    /// count / wrong responses; only for incorrect options with at least one wrong response.
    pub distractor_rate: Option<f64>,
}

/// Per-answer breakdown of how respondents distributed over the options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractorAnalysis {
    pub total_responses: usize,
    pub correct_count: usize,
    /// Answers in letter order.
    pub answers: Vec<AnswerBreakdown>,
}

impl DistractorAnalysis {
    /// Number of responses that were not correct.
    pub fn wrong_total(&self) -> usize {
        self.total_responses - self.correct_count
    }
}

/// Spreadsheet-style letter for a zero-based option index: A..Z, AA, AB, ...
pub fn answer_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Truncate to `max` characters, appending `...` when anything was cut.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}

/// Break down answer selections for one question.
///
/// Responses without a recorded answer still count toward `total_responses`
/// but not toward any option or toward `correct_count`. Returns `None` when
/// nobody answered.
pub fn distractor_analysis(
    responses: &[ResponseRecord],
    question: &Question,
) -> Option<DistractorAnalysis> {
    if responses.is_empty() {
        return None;
    }

    let mut selection_counts: HashMap<AnswerId, usize> = HashMap::new();
    let mut correct_count = 0usize;
    for r in responses {
        if let Some(answer_id) = r.answer_id {
            *selection_counts.entry(answer_id).or_default() += 1;
            if r.correct {
                correct_count += 1;
            }
        }
    }

    let total_responses = responses.len();
    let wrong_total = total_responses - correct_count;

    // Declaration order is letter order, so no further sort is needed.
    let answers = question
        .answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let count = selection_counts.get(&answer.id).copied().unwrap_or(0);
            let is_correct = answer.is_correct();
            let distractor_rate = if !is_correct && wrong_total > 0 {
                Some(count as f64 / wrong_total as f64)
            } else {
                None
            };
            AnswerBreakdown {
                answer_id: answer.id,
                letter: answer_letter(i),
                text: truncate_text(&answer.text, ANSWER_TEXT_DISPLAY_LEN),
                is_correct,
                count,
                selection_rate: count as f64 / total_responses as f64,
                distractor_rate,
            }
        })
        .collect();

    Some(DistractorAnalysis {
        total_responses,
        correct_count,
        answers,
    })
}

/// Point-biserial correlation between item correctness and course grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointBiserial {
    pub r_pb: f64,
    /// Mean grade of students who answered correctly (M1).
    pub mean_correct: f64,
    /// Mean grade of students who answered incorrectly (M0).
    pub mean_incorrect: f64,
    pub n_correct: usize,
    pub n_incorrect: usize,
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population variance (divides by n); `None` for an empty slice.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Compute r_pb = ((M1 - M0) / S) * sqrt(p q) for one question.
///
/// Requires at least [`MIN_POINT_BISERIAL_GROUP`] graded students on each
/// side. S is the population standard deviation of the pooled grades, with
/// S = 1 substituted when the variance is exactly zero.
pub fn point_biserial(responses: &[ResponseRecord], grades: &GradeBook) -> Option<PointBiserial> {
    let (correct, incorrect): (Vec<GradedResponse>, Vec<GradedResponse>) =
        graded_responses(responses, grades)
            .into_iter()
            .partition(|g| g.correct);

    if correct.len() < MIN_POINT_BISERIAL_GROUP || incorrect.len() < MIN_POINT_BISERIAL_GROUP {
        return None;
    }

    let correct_grades: Vec<f64> = correct.iter().map(|g| g.grade).collect();
    let incorrect_grades: Vec<f64> = incorrect.iter().map(|g| g.grade).collect();

    let m1 = mean(&correct_grades)?;
    let m0 = mean(&incorrect_grades)?;

    let pooled: Vec<f64> = correct_grades
        .iter()
        .chain(incorrect_grades.iter())
        .copied()
        .collect();
    let variance = population_variance(&pooled)?;
    let std_dev = if variance > 0.0 { variance.sqrt() } else { 1.0 };

    let p = correct_grades.len() as f64 / pooled.len() as f64;
    let q = 1.0 - p;

    let r_pb = if std_dev > 0.0 && p > 0.0 && q > 0.0 {
        (m1 - m0) / std_dev * (p * q).sqrt()
    } else {
        0.0
    };

    Some(PointBiserial {
        r_pb,
        mean_correct: m1,
        mean_incorrect: m0,
        n_correct: correct_grades.len(),
        n_incorrect: incorrect_grades.len(),
    })
}

/// Quiz-level distribution of submission scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub mean_score: f64,
    /// Upper median: the element at index n/2 of the sorted scores.
    pub median_score: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub points_possible: f64,
}

impl ScoreSummary {
    /// Summarize a set of scores; `None` when there are none.
    pub fn from_scores(scores: &[f64], points_possible: f64) -> Option<Self> {
        let mean_score = mean(scores)?;
        let variance = population_variance(scores)?;

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            mean_score,
            median_score: sorted[sorted.len() / 2],
            std_dev: variance.sqrt(),
            min_score: sorted[0],
            max_score: sorted[sorted.len() - 1],
            points_possible,
        })
    }

    /// Mean score as a fraction of the points possible.
    pub fn mean_fraction(&self) -> Option<f64> {
        if self.points_possible > 0.0 {
            Some(self.mean_score / self.points_possible)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;

    fn responses(pattern: &[(&str, Option<AnswerId>, bool)]) -> Vec<ResponseRecord> {
        pattern
            .iter()
            .map(|(s, a, c)| ResponseRecord::new(*s, *a, *c))
            .collect()
    }

    /// `n` students `s00..`, graded 100, 99, ... in order, with the given correctness.
    fn ranked_class(correct: &[bool]) -> (Vec<ResponseRecord>, GradeBook) {
        let mut book = GradeBook::new();
        let records = correct
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let id = format!("s{i:02}");
                book.insert(id.clone(), 100.0 - i as f64);
                ResponseRecord::new(id, Some(1), c)
            })
            .collect();
        (records, book)
    }

    fn question(weights: &[f64]) -> Question {
        Question {
            id: 1,
            position: 1,
            text: String::new(),
            question_type: "multiple_choice_question".into(),
            points: None,
            answers: weights
                .iter()
                .enumerate()
                .map(|(i, &w)| Answer {
                    id: i as AnswerId + 1,
                    text: format!("option {}", i + 1),
                    weight: w,
                })
                .collect(),
        }
    }

    #[test]
    fn difficulty_twelve_of_twenty() {
        let recs: Vec<_> = (0..20)
            .map(|i| ResponseRecord::new(format!("s{i}"), Some(1), i < 12))
            .collect();
        assert!((difficulty(&recs).unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn difficulty_absent_vs_zero() {
        assert_eq!(difficulty(&[]), None);
        let all_wrong = responses(&[("a", Some(2), false), ("b", Some(3), false)]);
        assert_eq!(difficulty(&all_wrong), Some(0.0));
    }

    #[test]
    fn group_sizes() {
        assert_eq!(GroupingMethod::TopBottom27.group_size(10), 3);
        assert_eq!(GroupingMethod::TopBottom27.group_size(100), 27);
        assert_eq!(GroupingMethod::TopBottom27.group_size(37), 10);
        assert_eq!(GroupingMethod::TopBottom27.group_size(1), 1);
        assert_eq!(GroupingMethod::Thirds.group_size(11), 3);
        assert_eq!(GroupingMethod::Median.group_size(10), 5);
        assert_eq!(GroupingMethod::Median.group_size(11), 5);
    }

    #[test]
    fn grouping_method_parse_and_display() {
        assert_eq!(
            "top_bottom_27".parse::<GroupingMethod>().unwrap(),
            GroupingMethod::TopBottom27
        );
        assert_eq!("Thirds".parse::<GroupingMethod>().unwrap(), GroupingMethod::Thirds);
        assert_eq!(GroupingMethod::Median.to_string(), "median");
        assert!(matches!(
            "quartiles".parse::<GroupingMethod>(),
            Err(ConfigError::UnknownGroupingMethod(_))
        ));
        let json = serde_json::to_string(&GroupingMethod::TopBottom27).unwrap();
        assert_eq!(json, "\"top_bottom_27\"");
    }

    #[test]
    fn discrimination_requires_ten_graded_students() {
        let (recs, book) = ranked_class(&[true]);
        assert_eq!(discrimination(&recs, &book, GroupingMethod::Median), None);

        let (recs, _) = ranked_class(&[true; 12]);
        // Nobody has a grade, so nobody qualifies.
        assert_eq!(
            discrimination(&recs, &GradeBook::new(), GroupingMethod::Median),
            None
        );
    }

    #[test]
    fn discrimination_median_split_of_ten() {
        // Top five all correct, bottom five all wrong.
        let pattern = [true, true, true, true, true, false, false, false, false, false];
        let (recs, book) = ranked_class(&pattern);
        let d = discrimination(&recs, &book, GroupingMethod::Median).unwrap();
        assert_eq!(d.upper_n, 5);
        assert_eq!(d.lower_n, 5);
        assert!((d.p_upper - 1.0).abs() < 1e-12);
        assert!(d.p_lower.abs() < 1e-12);
        assert!((d.d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn discrimination_ranks_by_grade_not_input_order() {
        // Reverse the input order; the ranking must still put s00 on top.
        let pattern = [true, true, true, false, false, false, false, false, false, false];
        let (mut recs, book) = ranked_class(&pattern);
        recs.reverse();
        let d = discrimination(&recs, &book, GroupingMethod::TopBottom27).unwrap();
        assert_eq!(d.upper_n, 3);
        assert!((d.p_upper - 1.0).abs() < 1e-12);
        assert!(d.p_lower.abs() < 1e-12);
    }

    #[test]
    fn discrimination_negative_when_low_performers_do_better() {
        let pattern = [false, false, false, true, true, true, true, true, true, true, true, true];
        let (recs, book) = ranked_class(&pattern);
        let d = discrimination(&recs, &book, GroupingMethod::Thirds).unwrap();
        assert_eq!(d.upper_n, 4);
        assert!((d.p_upper - 0.25).abs() < 1e-12);
        assert!((d.p_lower - 1.0).abs() < 1e-12);
        assert!(d.d < 0.0 && d.d >= -1.0);
    }

    #[test]
    fn distractor_rates() {
        let q = question(&[100.0, 0.0, 0.0]);
        let mut pattern: Vec<(&str, Option<AnswerId>, bool)> = Vec::new();
        let ids = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        for (i, id) in ids.iter().enumerate() {
            let (ans, ok) = match i {
                0..=5 => (1, true),
                6..=8 => (2, false),
                _ => (3, false),
            };
            pattern.push((*id, Some(ans), ok));
        }
        let analysis = distractor_analysis(&responses(&pattern), &q).unwrap();

        assert_eq!(analysis.total_responses, 10);
        assert_eq!(analysis.correct_count, 6);
        assert_eq!(analysis.wrong_total(), 4);
        let letters: Vec<_> = analysis.answers.iter().map(|a| a.letter.as_str()).collect();
        assert_eq!(letters, ["A", "B", "C"]);

        let total: usize = analysis.answers.iter().map(|a| a.count).sum();
        assert_eq!(total, analysis.total_responses);
        let rate_sum: f64 = analysis.answers.iter().map(|a| a.selection_rate).sum();
        assert!((rate_sum - 1.0).abs() < 1e-9);

        assert!(analysis.answers[0].is_correct);
        assert_eq!(analysis.answers[0].distractor_rate, None);
        assert!((analysis.answers[1].distractor_rate.unwrap() - 0.75).abs() < 1e-12);
        assert!((analysis.answers[2].distractor_rate.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn distractor_rate_undefined_when_everyone_is_correct() {
        let q = question(&[0.0, 100.0, 0.0, 0.0]);
        let recs = responses(&[("a", Some(2), true), ("b", Some(2), true), ("c", Some(2), true)]);
        let analysis = distractor_analysis(&recs, &q).unwrap();
        assert_eq!(analysis.wrong_total(), 0);
        assert!(analysis.answers.iter().all(|a| a.distractor_rate.is_none()));
        assert_eq!(analysis.answers[1].count, 3);
        assert_eq!(analysis.answers[0].count, 0);
    }

    #[test]
    fn distractor_absent_without_responses() {
        assert_eq!(distractor_analysis(&[], &question(&[100.0, 0.0])), None);
    }

    #[test]
    fn distractor_counts_blank_responses_in_total_only() {
        let q = question(&[100.0, 0.0]);
        let recs = responses(&[("a", Some(1), true), ("b", None, false), ("c", Some(2), false)]);
        let analysis = distractor_analysis(&recs, &q).unwrap();
        assert_eq!(analysis.total_responses, 3);
        assert_eq!(analysis.correct_count, 1);
        assert!((analysis.answers[1].distractor_rate.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn answer_text_truncation() {
        let mut q = question(&[100.0, 0.0]);
        q.answers[0].text = "x".repeat(60);
        let analysis = distractor_analysis(&responses(&[("a", Some(1), true)]), &q).unwrap();
        assert_eq!(analysis.answers[0].text.chars().count(), 53);
        assert!(analysis.answers[0].text.ends_with("..."));
        assert_eq!(analysis.answers[1].text, "option 2");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn letters_beyond_z() {
        assert_eq!(answer_letter(0), "A");
        assert_eq!(answer_letter(25), "Z");
        assert_eq!(answer_letter(26), "AA");
        assert_eq!(answer_letter(27), "AB");
    }

    #[test]
    fn point_biserial_known_value() {
        let mut book = GradeBook::new();
        for (id, g) in [("a", 90.0), ("b", 80.0), ("c", 60.0), ("d", 70.0)] {
            book.insert(id, g);
        }
        let recs = responses(&[
            ("a", Some(1), true),
            ("b", Some(1), true),
            ("c", Some(2), false),
            ("d", Some(2), false),
        ]);
        let pb = point_biserial(&recs, &book).unwrap();
        assert!((pb.mean_correct - 85.0).abs() < 1e-12);
        assert!((pb.mean_incorrect - 65.0).abs() < 1e-12);
        // (20 / sqrt(125)) * 0.5
        assert!((pb.r_pb - 0.894_427_190_999_915_9).abs() < 1e-9);
        assert_eq!((pb.n_correct, pb.n_incorrect), (2, 2));
    }

    #[test]
    fn point_biserial_needs_two_on_each_side() {
        let mut book = GradeBook::new();
        for (id, g) in [("a", 90.0), ("b", 80.0), ("c", 60.0)] {
            book.insert(id, g);
        }
        let recs = responses(&[("a", Some(1), true), ("b", Some(1), true), ("c", Some(2), false)]);
        assert_eq!(point_biserial(&recs, &book), None);
    }

    #[test]
    fn point_biserial_zero_variance_uses_unit_sd() {
        let mut book = GradeBook::new();
        for id in ["a", "b", "c", "d"] {
            book.insert(id, 80.0);
        }
        let recs = responses(&[
            ("a", Some(1), true),
            ("b", Some(1), true),
            ("c", Some(2), false),
            ("d", Some(2), false),
        ]);
        let pb = point_biserial(&recs, &book).unwrap();
        assert_eq!(pb.r_pb, 0.0);
    }

    #[test]
    fn score_summary() {
        let summary = ScoreSummary::from_scores(&[30.0, 50.0, 40.0, 20.0], 50.0).unwrap();
        assert!((summary.mean_score - 35.0).abs() < 1e-12);
        assert_eq!(summary.median_score, 40.0);
        assert_eq!(summary.min_score, 20.0);
        assert_eq!(summary.max_score, 50.0);
        assert!((summary.std_dev - 125.0f64.sqrt()).abs() < 1e-12);
        assert!((summary.mean_fraction().unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(ScoreSummary::from_scores(&[], 50.0), None);
    }
}
