//! Analysis configuration and loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::statistics::GroupingMethod;

/// Difficulty (p-value) thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyThresholds {
    /// p above this is flagged as too easy.
    #[serde(default = "default_too_easy")]
    pub too_easy: f64,
    /// p below this is flagged as too difficult.
    #[serde(default = "default_too_hard")]
    pub too_hard: f64,
}

/// Discrimination index thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminationThresholds {
    /// D below this is a critical (negative discrimination) flag.
    #[serde(default = "default_critical")]
    pub critical: f64,
    /// D below this (but not below `critical`) is a poor-discrimination warning.
    #[serde(default = "default_discrimination_flag_below")]
    pub flag_below: f64,
}

/// Point-biserial thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointBiserialThresholds {
    /// r_pb below this is a low-correlation warning.
    #[serde(default = "default_point_biserial_flag_below")]
    pub flag_below: f64,
}

fn default_too_easy() -> f64 {
    0.90
}
fn default_too_hard() -> f64 {
    0.30
}
fn default_critical() -> f64 {
    0.0
}
fn default_discrimination_flag_below() -> f64 {
    0.20
}
fn default_point_biserial_flag_below() -> f64 {
    0.20
}

impl Default for DifficultyThresholds {
    fn default() -> Self {
        Self {
            too_easy: default_too_easy(),
            too_hard: default_too_hard(),
        }
    }
}

impl Default for DiscriminationThresholds {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            flag_below: default_discrimination_flag_below(),
        }
    }
}

impl Default for PointBiserialThresholds {
    fn default() -> Self {
        Self {
            flag_below: default_point_biserial_flag_below(),
        }
    }
}

/// All numeric thresholds consumed by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub difficulty: DifficultyThresholds,
    #[serde(default)]
    pub discrimination: DiscriminationThresholds,
    #[serde(default)]
    pub point_biserial: PointBiserialThresholds,
}

impl Thresholds {
    /// Reject thresholds that cannot produce a coherent evaluation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.difficulty;
        for (name, value) in [
            ("difficulty.too_easy", d.too_easy),
            ("difficulty.too_hard", d.too_hard),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        if d.too_easy <= d.too_hard {
            return Err(ConfigError::Inverted {
                upper: "difficulty.too_easy",
                upper_value: d.too_easy,
                lower: "difficulty.too_hard",
                lower_value: d.too_hard,
            });
        }

        let disc = &self.discrimination;
        for (name, value) in [
            ("discrimination.critical", disc.critical),
            ("discrimination.flag_below", disc.flag_below),
            ("point_biserial.flag_below", self.point_biserial.flag_below),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfCorrelationRange { name, value });
            }
        }
        if disc.critical > disc.flag_below {
            return Err(ConfigError::Inverted {
                upper: "discrimination.flag_below",
                upper_value: disc.flag_below,
                lower: "discrimination.critical",
                lower_value: disc.critical,
            });
        }

        Ok(())
    }
}

/// How students are split into upper and lower groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    #[serde(default)]
    pub method: GroupingMethod,
}

/// Where data, analyses, and reports live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw quiz exports, one subdirectory per section.
    #[serde(default = "default_raw_data")]
    pub raw_data: PathBuf,
    /// Saved `<section>_analysis.json` files.
    #[serde(default = "default_processed")]
    pub processed: PathBuf,
    /// Per-quiz Markdown reports, one subdirectory per section.
    #[serde(default = "default_reports")]
    pub reports: PathBuf,
    #[serde(default = "default_dashboards")]
    pub dashboards: PathBuf,
    #[serde(default = "default_flagged")]
    pub flagged: PathBuf,
}

fn default_raw_data() -> PathBuf {
    PathBuf::from("data/raw")
}
fn default_processed() -> PathBuf {
    PathBuf::from("data/processed")
}
fn default_reports() -> PathBuf {
    PathBuf::from("reports")
}
fn default_dashboards() -> PathBuf {
    PathBuf::from("dashboards")
}
fn default_flagged() -> PathBuf {
    PathBuf::from("reports/flagged")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: default_raw_data(),
            processed: default_processed(),
            reports: default_reports(),
            dashboards: default_dashboards(),
            flagged: default_flagged(),
        }
    }
}

impl PathsConfig {
    /// Directory holding the raw exports of one section.
    pub fn raw_dir(&self, section: &str) -> PathBuf {
        self.raw_data.join(section)
    }

    /// Path of the saved analysis for one section.
    pub fn analysis_file(&self, section: &str) -> PathBuf {
        self.processed.join(format!("{section}_analysis.json"))
    }

    pub fn report_dir(&self, section: &str) -> PathBuf {
        self.reports.join(section)
    }

    pub fn dashboard_file(&self, section: &str) -> PathBuf {
        self.dashboards.join(format!("{section}_dashboard.html"))
    }

    pub fn flagged_file(&self, section: &str) -> PathBuf {
        self.flagged.join(format!("{section}_flagged.md"))
    }
}

/// Descriptive metadata for one course section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub course_id: Option<u64>,
}

/// Top-level quizstat configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub grouping: Grouping,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Known sections keyed by section key (e.g. `spring2026_001`).
    #[serde(default)]
    pub courses: BTreeMap<String, CourseConfig>,
}

impl AnalysisConfig {
    /// Semester label of a section, if configured.
    pub fn semester(&self, section: &str) -> Option<&str> {
        self.courses
            .get(section)
            .map(|c| c.semester.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Parse and validate a configuration from a TOML string.
pub fn parse_config_str(content: &str) -> Result<AnalysisConfig> {
    let config: AnalysisConfig = toml::from_str(content).context("failed to parse config TOML")?;
    finish(config)
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizstat.toml` in the current directory
/// 2. `~/.config/quizstat/config.toml`
///
/// Environment variable override: `QUIZSTAT_GROUPING_METHOD`.
pub fn load_config() -> Result<AnalysisConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizstat.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AnalysisConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    finish(config)
}

/// Apply environment overrides, expand path variables, and validate.
fn finish(mut config: AnalysisConfig) -> Result<AnalysisConfig> {
    if let Ok(method) = std::env::var("QUIZSTAT_GROUPING_METHOD") {
        config.grouping.method = method.parse()?;
    }

    let paths = &mut config.paths;
    for p in [
        &mut paths.raw_data,
        &mut paths.processed,
        &mut paths.reports,
        &mut paths.dashboards,
        &mut paths.flagged,
    ] {
        *p = resolve_path(p);
    }

    config.thresholds.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizstat"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.thresholds.difficulty.too_easy, 0.90);
        assert_eq!(config.thresholds.difficulty.too_hard, 0.30);
        assert_eq!(config.thresholds.discrimination.critical, 0.0);
        assert_eq!(config.grouping.method, GroupingMethod::TopBottom27);
        assert!(config.thresholds.validate().is_ok());
    }

    #[test]
    fn parse_partial_config_fills_defaults() {
        let toml_str = r#"
[thresholds.discrimination]
critical = -0.02

[grouping]
method = "thirds"

[paths]
raw_data = "exports"

[courses.spring2026_001]
name = "PSYC 405"
semester = "Spring 2026"
"#;
        let config = parse_config_str(toml_str).unwrap();
        assert_eq!(config.thresholds.discrimination.critical, -0.02);
        assert_eq!(config.thresholds.discrimination.flag_below, 0.20);
        assert_eq!(config.thresholds.point_biserial.flag_below, 0.20);
        assert_eq!(config.grouping.method, GroupingMethod::Thirds);
        assert_eq!(config.paths.raw_dir("s1"), PathBuf::from("exports/s1"));
        assert_eq!(
            config.paths.analysis_file("s1"),
            PathBuf::from("data/processed/s1_analysis.json")
        );
        assert_eq!(config.semester("spring2026_001"), Some("Spring 2026"));
        assert_eq!(config.semester("unknown"), None);
    }

    #[test]
    fn unknown_grouping_method_is_rejected() {
        let result = parse_config_str("[grouping]\nmethod = \"quartiles\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn inverted_difficulty_thresholds_are_rejected() {
        let mut t = Thresholds::default();
        t.difficulty.too_easy = 0.2;
        t.difficulty.too_hard = 0.4;
        let err = t.validate().unwrap_err();
        assert_eq!(err.key(), "difficulty.too_easy");
    }

    #[test]
    fn critical_above_flag_below_is_rejected() {
        let mut t = Thresholds::default();
        t.discrimination.critical = 0.3;
        assert!(matches!(t.validate(), Err(ConfigError::Inverted { .. })));
    }

    #[test]
    fn out_of_range_proportion_is_rejected() {
        let mut t = Thresholds::default();
        t.difficulty.too_easy = 1.5;
        assert_eq!(
            t.validate(),
            Err(ConfigError::OutOfRange {
                name: "difficulty.too_easy",
                value: 1.5
            })
        );
    }

    #[test]
    fn resolve_env_vars_in_paths() {
        std::env::set_var("_QUIZSTAT_TEST_ROOT", "/srv/course");
        assert_eq!(
            resolve_env_vars("${_QUIZSTAT_TEST_ROOT}/raw"),
            "/srv/course/raw"
        );
        assert_eq!(resolve_env_vars("no vars"), "no vars");
        std::env::remove_var("_QUIZSTAT_TEST_ROOT");
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizstat.toml");
        std::fs::write(&path, "[grouping]\nmethod = \"median\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.grouping.method, GroupingMethod::Median);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
