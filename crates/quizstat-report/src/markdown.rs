//! Markdown report generator.
//!
//! Produces one item-analysis report per quiz and a section-wide summary of
//! flagged questions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizstat_core::analysis::QuizAnalysis;
use quizstat_core::evaluate::{DifficultyBand, DiscriminationBand, Severity};
use quizstat_core::report::{FlaggedItem, SectionAnalysis};
use quizstat_core::statistics::truncate_text;

/// Question text shown in a quiz report is cut to this many characters.
const QUESTION_PREVIEW_LEN: usize = 150;

/// Quiz titles in summary tables are cut to this many characters.
const TITLE_COLUMN_LEN: usize = 30;

/// At most this many excellent questions are listed.
const EXCELLENT_LIMIT: usize = 10;

/// Format a proportion as a percentage, or `N/A` when absent.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "N/A".to_string(),
    }
}

/// Format a statistic with two decimals, or `N/A` when absent.
pub fn format_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "N/A".to_string(),
    }
}

/// Remove anything between `<` and `>`.
pub fn strip_html_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Markdown table cells cannot contain pipes or newlines.
fn table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn short_title(title: &str) -> String {
    table_cell(&title.chars().take(TITLE_COLUMN_LEN).collect::<String>())
}

/// Generate the Markdown report for a single quiz.
pub fn quiz_markdown(quiz: &QuizAnalysis, analysis: &SectionAnalysis) -> String {
    let title = if quiz.title.is_empty() {
        "Unknown Quiz"
    } else {
        quiz.title.as_str()
    };
    let group = analysis.config.grouping.method.group_label();

    let mut md = String::new();
    md.push_str(&format!("# {title} - Performance Analysis\n\n"));
    md.push_str(&format!(
        "**Section:** {} | **Analyzed:** {}\n",
        analysis.section,
        analysis.analyzed_at.format("%Y-%m-%d")
    ));
    md.push_str(&format!(
        "**Submissions:** {} students\n\n",
        quiz.submission_count
    ));

    md.push_str("## Summary Statistics\n\n");
    match &quiz.summary.scores {
        Some(s) => {
            md.push_str(&format!(
                "- **Mean Score:** {:.1} / {} ({})\n",
                s.mean_score,
                s.points_possible,
                format_percentage(s.mean_fraction())
            ));
            md.push_str(&format!("- **Median:** {:.1}\n", s.median_score));
            md.push_str(&format!("- **Std Dev:** {:.2}\n", s.std_dev));
            md.push_str(&format!(
                "- **Range:** {:.0} - {:.0}\n",
                s.min_score, s.max_score
            ));
        }
        None => md.push_str("*No score data available*\n"),
    }
    if let Some(error) = &quiz.summary.error {
        md.push_str(&format!("\n*{error}*\n"));
    }

    md.push_str(&format!("\n**Flagged Issues:** {}\n", quiz.summary.total_flags));
    if quiz.summary.critical_flags > 0 {
        md.push_str(&format!(
            "**Critical Issues:** {}\n",
            quiz.summary.critical_flags
        ));
    }
    md.push('\n');

    md.push_str("## Item Analysis\n\n");
    for (i, q) in quiz.questions.iter().enumerate() {
        md.push_str(&format!("### Question {}\n\n", i + 1));

        let text = strip_html_tags(&q.text);
        let text = text.trim();
        if !text.is_empty() {
            md.push_str(&format!(
                "> {}\n\n",
                truncate_text(text, QUESTION_PREVIEW_LEN).replace('\n', " ")
            ));
        }

        md.push_str(&format!(
            "**Difficulty (p):** {} ({})\n",
            format_percentage(q.difficulty),
            DifficultyBand::classify(q.difficulty)
        ));

        let d_value = q.discrimination.as_ref().map(|d| d.d);
        md.push_str(&format!(
            "**Discrimination (D):** {} ({})\n",
            format_decimal(d_value),
            DiscriminationBand::classify(d_value)
        ));
        if let Some(d) = &q.discrimination {
            md.push_str(&format!(
                "  - Upper {group}: {} (n={})\n",
                format_percentage(Some(d.p_upper)),
                d.upper_n
            ));
            md.push_str(&format!(
                "  - Lower {group}: {} (n={})\n",
                format_percentage(Some(d.p_lower)),
                d.lower_n
            ));
        }

        md.push_str(&format!(
            "**Point-Biserial r:** {}\n",
            format_decimal(q.point_biserial.as_ref().map(|pb| pb.r_pb))
        ));

        if let Some(distractor) = q.distractor_analysis.as_ref().filter(|d| !d.answers.is_empty()) {
            md.push_str("\n| Answer | Text | Selected | Rate | Distractor Rate |\n");
            md.push_str("|--------|------|----------|------|-----------------|\n");
            for ans in &distractor.answers {
                let marker = if ans.is_correct { "*" } else { "" };
                md.push_str(&format!(
                    "| {}{} | {} | {} | {} | {} |\n",
                    ans.letter,
                    marker,
                    table_cell(&strip_html_tags(&ans.text)),
                    ans.count,
                    format_percentage(Some(ans.selection_rate)),
                    if ans.is_correct {
                        "-".to_string()
                    } else {
                        format_percentage(ans.distractor_rate)
                    }
                ));
            }
        }
        md.push('\n');

        let flags = &q.evaluation.flags;
        if flags.is_empty() {
            md.push_str("*No issues flagged*\n\n");
        } else {
            md.push_str("**Issues:**\n");
            for flag in flags {
                let icon = if flag.severity == Severity::Critical {
                    "🔴"
                } else {
                    "⚠️"
                };
                md.push_str(&format!(
                    "- {icon} {}: {}\n",
                    flag.message,
                    format_decimal(Some(flag.value))
                ));
                md.push_str(&format!("  - *{}*\n", flag.recommendation));
            }
            md.push('\n');
        }

        md.push_str("---\n\n");
    }

    md
}

fn push_issue_table(md: &mut String, items: &[FlaggedItem<'_>]) {
    md.push_str("| Quiz | Q# | Difficulty | Discrimination | Issue |\n");
    md.push_str("|------|-----|------------|----------------|-------|\n");
    for item in items {
        let q = item.question;
        let issues = q
            .evaluation
            .flags
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            short_title(item.quiz_title),
            item.number,
            format_percentage(q.difficulty),
            format_decimal(q.discrimination.as_ref().map(|d| d.d)),
            issues
        ));
    }
    md.push('\n');
}

/// Generate the section-wide summary of flagged questions.
pub fn flagged_summary(analysis: &SectionAnalysis) -> String {
    let flagged = analysis.flagged();
    let mut md = String::new();

    md.push_str(&format!("# Flagged Questions - {}\n\n", analysis.section));
    md.push_str(&format!(
        "**Generated:** {}\n\n",
        analysis.analyzed_at.format("%Y-%m-%d %H:%M")
    ));

    if flagged.critical.is_empty() {
        md.push_str("## 🔴 Critical Issues\n\n*None found*\n\n");
    } else {
        md.push_str("## 🔴 Critical Issues (Requires Immediate Revision)\n\n");
        push_issue_table(&mut md, &flagged.critical);
    }

    if flagged.warning.is_empty() {
        md.push_str("## ⚠️ Moderate Issues\n\n*None found*\n\n");
    } else {
        md.push_str("## ⚠️ Moderate Issues (Review for Next Semester)\n\n");
        push_issue_table(&mut md, &flagged.warning);
    }

    if !flagged.excellent.is_empty() {
        md.push_str("## ✅ Excellent Questions (Models for Future)\n\n");
        md.push_str("| Quiz | Q# | Difficulty | Discrimination |\n");
        md.push_str("|------|-----|------------|----------------|\n");
        for item in flagged.excellent.iter().take(EXCELLENT_LIMIT) {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                short_title(item.quiz_title),
                item.number,
                format_percentage(item.question.difficulty),
                format_decimal(item.question.discrimination.as_ref().map(|d| d.d)),
            ));
        }
        md.push('\n');
    }

    md.push_str("## Summary\n\n");
    md.push_str(&format!(
        "- **Total Questions Analyzed:** {}\n",
        analysis.total_questions()
    ));
    md.push_str(&format!("- **Critical Issues:** {}\n", flagged.critical.len()));
    md.push_str(&format!("- **Warnings:** {}\n", flagged.warning.len()));
    md.push_str(&format!(
        "- **Excellent Questions:** {}\n",
        flagged.excellent.len()
    ));

    md
}

/// File name of a quiz report, e.g. `quiz_101_week_2_quiz_analysis.md`.
pub fn quiz_report_filename(quiz: &QuizAnalysis) -> String {
    let slug: String = quiz
        .title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .take(TITLE_COLUMN_LEN)
        .collect();
    let slug = if slug.is_empty() { "unknown".to_string() } else { slug };
    format!("quiz_{}_{}_analysis.md", quiz.quiz_id, slug)
}

/// Write one Markdown report per quiz into `dir`, returning the written paths.
pub fn write_quiz_reports(analysis: &SectionAnalysis, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(analysis.quizzes.len());
    for quiz in &analysis.quizzes {
        let path = dir.join(quiz_report_filename(quiz));
        std::fs::write(&path, quiz_markdown(quiz, analysis))
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Write the flagged-questions summary to a file.
pub fn write_flagged_summary(analysis: &SectionAnalysis, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, flagged_summary(analysis))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::section_analysis;

    #[test]
    fn formatting_helpers() {
        assert_eq!(format_percentage(Some(0.6)), "60.0%");
        assert_eq!(format_percentage(None), "N/A");
        assert_eq!(format_decimal(Some(-0.05)), "-0.05");
        assert_eq!(format_decimal(None), "N/A");
        assert_eq!(strip_html_tags("<p>a <b>b</b></p>"), "a b");
        assert_eq!(strip_html_tags("x > y"), "x > y");
    }

    #[test]
    fn quiz_report_contains_metrics_and_flags() {
        let analysis = section_analysis();
        let md = quiz_markdown(&analysis.quizzes[0], &analysis);

        assert!(md.starts_with("# Week 2 Quiz - Performance Analysis"));
        assert!(md.contains("**Submissions:** 15 students"));
        assert!(md.contains("> Which memory system is implicated?"));
        assert!(md.contains("Upper 27%"));
        assert!(md.contains("| A* | Correct answer |"));
        assert!(md.contains("🔴 Negative discrimination"));
        assert!(md.contains("Too easy"));
        assert!(md.contains("*No issues flagged*"));
        assert_eq!(md.matches("### Question").count(), 3);
    }

    #[test]
    fn empty_quiz_report_explains_itself() {
        let analysis = section_analysis();
        let md = quiz_markdown(&analysis.quizzes[1], &analysis);
        assert!(md.contains("*No score data available*"));
        assert!(md.contains("No submission or question data available"));
    }

    #[test]
    fn flagged_summary_sections() {
        let analysis = section_analysis();
        let md = flagged_summary(&analysis);

        assert!(md.contains("# Flagged Questions - spring2026_001"));
        assert!(md.contains("Critical Issues (Requires Immediate Revision)"));
        assert!(md.contains("Moderate Issues (Review for Next Semester)"));
        assert!(md.contains("Excellent Questions (Models for Future)"));
        assert!(md.contains("- **Total Questions Analyzed:** 3"));
        assert!(md.contains("- **Critical Issues:** 1"));
    }

    #[test]
    fn report_filenames_are_slugged() {
        let analysis = section_analysis();
        assert_eq!(
            quiz_report_filename(&analysis.quizzes[0]),
            "quiz_101_week_2_quiz_analysis.md"
        );
        assert_eq!(
            quiz_report_filename(&analysis.quizzes[1]),
            "quiz_102_unreleased__draft__analysis.md"
        );
    }

    #[test]
    fn write_reports_to_disk() {
        let analysis = section_analysis();
        let dir = tempfile::tempdir().unwrap();
        let written = write_quiz_reports(&analysis, &dir.path().join("reports")).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));

        let flagged = dir.path().join("flagged").join("s_flagged.md");
        write_flagged_summary(&analysis, &flagged).unwrap();
        assert!(std::fs::read_to_string(&flagged).unwrap().contains("Flagged Questions"));
    }
}
