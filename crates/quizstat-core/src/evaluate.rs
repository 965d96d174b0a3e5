//! Threshold evaluation: turns item metrics into flags and a severity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::statistics::{Discrimination, PointBiserial};

/// Ordinal item severity. Once an item is critical it stays critical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Good,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Good => write!(f, "good"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Which metric a flag was raised on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Difficulty,
    Discrimination,
    PointBiserial,
}

/// The specific problem a flag reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagIssue {
    TooEasy,
    TooDifficult,
    NegativeDiscrimination,
    PoorDiscrimination,
    LowCorrelation,
}

impl FlagIssue {
    pub fn kind(self) -> MetricKind {
        match self {
            FlagIssue::TooEasy | FlagIssue::TooDifficult => MetricKind::Difficulty,
            FlagIssue::NegativeDiscrimination | FlagIssue::PoorDiscrimination => {
                MetricKind::Discrimination
            }
            FlagIssue::LowCorrelation => MetricKind::PointBiserial,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            FlagIssue::NegativeDiscrimination => Severity::Critical,
            _ => Severity::Warning,
        }
    }

    /// Short human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            FlagIssue::TooEasy => "Too easy",
            FlagIssue::TooDifficult => "Too difficult",
            FlagIssue::NegativeDiscrimination => "Negative discrimination",
            FlagIssue::PoorDiscrimination => "Poor discrimination",
            FlagIssue::LowCorrelation => "Low correlation with final grade",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            FlagIssue::TooEasy => "Consider making question more challenging or removing",
            FlagIssue::TooDifficult => {
                "Review question wording, ensure content was covered in class"
            }
            FlagIssue::NegativeDiscrimination => {
                "CRITICAL: High performers getting this wrong. Check answer key and question clarity."
            }
            FlagIssue::PoorDiscrimination => {
                "Question doesn't distinguish between high and low performers"
            }
            FlagIssue::LowCorrelation => "Question may not measure intended course objectives",
        }
    }
}

impl fmt::Display for FlagIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A triggered threshold check. Never mutated after evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub kind: MetricKind,
    pub issue: FlagIssue,
    pub message: String,
    /// The measured metric value.
    pub value: f64,
    /// The threshold it crossed.
    pub threshold: f64,
    pub severity: Severity,
    pub recommendation: String,
}

impl Flag {
    pub fn new(issue: FlagIssue, value: f64, threshold: f64) -> Self {
        Self {
            kind: issue.kind(),
            issue,
            message: issue.message().to_string(),
            value,
            threshold,
            severity: issue.severity(),
            recommendation: issue.recommendation().to_string(),
        }
    }
}

/// Outcome of evaluating one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Triggered flags in check order: difficulty, discrimination, point-biserial.
    pub flags: Vec<Flag>,
    pub severity: Severity,
    pub flag_count: usize,
}

/// Evaluate one item's metrics against the configured thresholds.
///
/// Absent metrics are skipped. Checks run in a fixed order and only interact
/// through severity: a critical discrimination flag is terminal, and later
/// warnings never downgrade it.
pub fn evaluate_metrics(
    difficulty: Option<f64>,
    discrimination: Option<&Discrimination>,
    point_biserial: Option<&PointBiserial>,
    thresholds: &Thresholds,
) -> Evaluation {
    let mut flags = Vec::new();
    let mut severity = Severity::Good;

    if let Some(p) = difficulty {
        let t = &thresholds.difficulty;
        if p > t.too_easy {
            flags.push(Flag::new(FlagIssue::TooEasy, p, t.too_easy));
            severity = Severity::Warning;
        } else if p < t.too_hard {
            flags.push(Flag::new(FlagIssue::TooDifficult, p, t.too_hard));
            severity = Severity::Warning;
        }
    }

    if let Some(disc) = discrimination {
        let t = &thresholds.discrimination;
        if disc.d < t.critical {
            flags.push(Flag::new(FlagIssue::NegativeDiscrimination, disc.d, t.critical));
            severity = Severity::Critical;
        } else if disc.d < t.flag_below {
            flags.push(Flag::new(FlagIssue::PoorDiscrimination, disc.d, t.flag_below));
            if severity != Severity::Critical {
                severity = Severity::Warning;
            }
        }
    }

    if let Some(pb) = point_biserial {
        let t = &thresholds.point_biserial;
        if pb.r_pb < t.flag_below {
            flags.push(Flag::new(FlagIssue::LowCorrelation, pb.r_pb, t.flag_below));
            if severity == Severity::Good {
                severity = Severity::Warning;
            }
        }
    }

    let flag_count = flags.len();
    Evaluation {
        flags,
        severity,
        flag_count,
    }
}

/// Descriptive band for a difficulty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyBand {
    Unknown,
    TooDifficult,
    Difficult,
    Ideal,
    Easy,
    TooEasy,
}

impl DifficultyBand {
    pub fn classify(p: Option<f64>) -> Self {
        match p {
            None => DifficultyBand::Unknown,
            Some(p) if p < 0.30 => DifficultyBand::TooDifficult,
            Some(p) if p < 0.40 => DifficultyBand::Difficult,
            Some(p) if p <= 0.70 => DifficultyBand::Ideal,
            Some(p) if p <= 0.90 => DifficultyBand::Easy,
            Some(_) => DifficultyBand::TooEasy,
        }
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DifficultyBand::Unknown => "Unknown",
            DifficultyBand::TooDifficult => "Too Difficult",
            DifficultyBand::Difficult => "Difficult",
            DifficultyBand::Ideal => "Ideal",
            DifficultyBand::Easy => "Easy",
            DifficultyBand::TooEasy => "Too Easy",
        };
        f.write_str(label)
    }
}

/// Descriptive band for a discrimination index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminationBand {
    Unknown,
    Negative,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl DiscriminationBand {
    pub fn classify(d: Option<f64>) -> Self {
        match d {
            None => DiscriminationBand::Unknown,
            Some(d) if d < 0.0 => DiscriminationBand::Negative,
            Some(d) if d < 0.20 => DiscriminationBand::Poor,
            Some(d) if d < 0.30 => DiscriminationBand::Acceptable,
            Some(d) if d < 0.40 => DiscriminationBand::Good,
            Some(_) => DiscriminationBand::Excellent,
        }
    }
}

impl fmt::Display for DiscriminationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiscriminationBand::Unknown => "Unknown",
            DiscriminationBand::Negative => "NEGATIVE",
            DiscriminationBand::Poor => "Poor",
            DiscriminationBand::Acceptable => "Acceptable",
            DiscriminationBand::Good => "Good",
            DiscriminationBand::Excellent => "Excellent",
        };
        f.write_str(label)
    }
}
