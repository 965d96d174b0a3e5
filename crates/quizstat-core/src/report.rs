//! Section analysis results with JSON persistence and severity comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnalysisSettings, QuestionAnalysis, QuizAnalysis};
use crate::evaluate::Severity;
use crate::model::QuestionId;

/// Discrimination at or above this marks a good item as a model question.
pub const EXCELLENT_DISCRIMINATION: f64 = 0.40;

/// A complete analysis of one course section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    /// Unique analysis identifier.
    pub id: Uuid,
    /// Section key, e.g. `spring2026_001`.
    pub section: String,
    /// When the analysis was run.
    pub analyzed_at: DateTime<Utc>,
    /// Thresholds and grouping the analysis used.
    pub config: AnalysisSettings,
    pub quizzes: Vec<QuizAnalysis>,
}

/// One question pulled out of a section for the flagged summary.
#[derive(Debug, Clone)]
pub struct FlaggedItem<'a> {
    pub quiz_title: &'a str,
    /// 1-based question number within its quiz.
    pub number: usize,
    pub question: &'a QuestionAnalysis,
}

/// Questions grouped by what the instructor should do about them.
#[derive(Debug, Clone, Default)]
pub struct FlaggedQuestions<'a> {
    /// Requires immediate revision.
    pub critical: Vec<FlaggedItem<'a>>,
    /// Review before the next term.
    pub warning: Vec<FlaggedItem<'a>>,
    /// Good items with strong discrimination, worth reusing as models.
    pub excellent: Vec<FlaggedItem<'a>>,
}

impl SectionAnalysis {
    /// Save the analysis as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize analysis")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write analysis to {}", path.display()))?;
        Ok(())
    }

    /// Load an analysis from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis from {}", path.display()))?;
        let analysis: SectionAnalysis =
            serde_json::from_str(&content).context("failed to parse analysis JSON")?;
        Ok(analysis)
    }

    pub fn total_questions(&self) -> usize {
        self.quizzes.iter().map(|q| q.questions.len()).sum()
    }

    pub fn total_flags(&self) -> usize {
        self.quizzes.iter().map(|q| q.summary.total_flags).sum()
    }

    /// Number of critical questions across all quizzes.
    pub fn critical_count(&self) -> usize {
        self.quizzes.iter().map(|q| q.summary.critical_flags).sum()
    }

    /// Partition every question by severity.
    pub fn flagged(&self) -> FlaggedQuestions<'_> {
        let mut flagged = FlaggedQuestions::default();
        for quiz in &self.quizzes {
            for (i, question) in quiz.questions.iter().enumerate() {
                let item = FlaggedItem {
                    quiz_title: &quiz.title,
                    number: i + 1,
                    question,
                };
                match question.evaluation.severity {
                    Severity::Critical => flagged.critical.push(item),
                    Severity::Warning => flagged.warning.push(item),
                    Severity::Good => {
                        let strong = question
                            .discrimination
                            .as_ref()
                            .is_some_and(|d| d.d >= EXCELLENT_DISCRIMINATION);
                        if strong {
                            flagged.excellent.push(item);
                        }
                    }
                }
            }
        }
        flagged
    }

    /// Compare this analysis against a baseline to find questions whose severity changed.
    pub fn compare(&self, baseline: &SectionAnalysis) -> SeverityChangeReport {
        let severity_map = |analysis: &SectionAnalysis| -> HashMap<(u64, QuestionId), (String, Severity)> {
            let mut map = HashMap::new();
            for quiz in &analysis.quizzes {
                for q in &quiz.questions {
                    map.insert(
                        (quiz.quiz_id, q.question_id),
                        (quiz.title.clone(), q.evaluation.severity),
                    );
                }
            }
            map
        };

        let baseline_map = severity_map(baseline);
        let current_map = severity_map(self);

        let mut escalations = Vec::new();
        let mut resolutions = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;

        for (key, (title, current)) in &current_map {
            if let Some((_, baseline_severity)) = baseline_map.get(key) {
                let change = SeverityChange {
                    quiz_id: key.0,
                    quiz_title: title.clone(),
                    question_id: key.1,
                    baseline: *baseline_severity,
                    current: *current,
                };
                if current > baseline_severity {
                    escalations.push(change);
                } else if current < baseline_severity {
                    resolutions.push(change);
                } else {
                    unchanged += 1;
                }
            } else {
                new_questions += 1;
            }
        }

        let removed_questions = baseline_map
            .keys()
            .filter(|k| !current_map.contains_key(k))
            .count();

        let order = |c: &SeverityChange| (c.quiz_id, c.question_id);
        escalations.sort_by_key(order);
        resolutions.sort_by_key(order);

        SeverityChangeReport {
            escalations,
            resolutions,
            unchanged,
            new_questions,
            removed_questions,
        }
    }
}

/// Result of comparing two analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityChangeReport {
    /// Questions whose severity got worse.
    pub escalations: Vec<SeverityChange>,
    /// Questions whose severity improved.
    pub resolutions: Vec<SeverityChange>,
    pub unchanged: usize,
    /// Questions in current but not baseline.
    pub new_questions: usize,
    /// Questions in baseline but not current.
    pub removed_questions: usize,
}

/// A question whose severity differs between two analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityChange {
    pub quiz_id: u64,
    pub quiz_title: String,
    pub question_id: QuestionId,
    pub baseline: Severity,
    pub current: Severity,
}

impl SeverityChangeReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} escalations, {} resolutions, {} unchanged\n\n",
            self.escalations.len(),
            self.resolutions.len(),
            self.unchanged
        ));

        for (heading, changes) in [
            ("Escalations", &self.escalations),
            ("Resolutions", &self.resolutions),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Quiz | Question | Baseline | Current |\n");
            md.push_str("|------|----------|----------|---------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    c.quiz_title, c.question_id, c.baseline, c.current
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any question got worse.
    pub fn has_escalations(&self) -> bool {
        !self.escalations.is_empty()
    }
}
