//! HTML dashboard generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined and the charts
//! drawn as inline SVG.

use std::path::Path;

use anyhow::{Context, Result};

use quizstat_core::report::SectionAnalysis;

use crate::markdown::{format_decimal, format_percentage};

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the interactive dashboard for an analyzed section.
pub fn dashboard_html(analysis: &SectionAnalysis, semester: Option<&str>) -> String {
    let mut html = String::new();
    let section = html_escape(&analysis.section);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>Quiz Analytics - {section}</title>\n"));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Quiz Analytics Dashboard</h1>\n");
    let semester = semester.map(html_escape).unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">{section}{}{semester} | Analyzed {}</p>\n",
        if semester.is_empty() { "" } else { " | " },
        analysis.analyzed_at.format("%Y-%m-%d %H:%M UTC")
    ));
    html.push_str("</header>\n");

    // Stat cards
    html.push_str("<section class=\"cards\">\n");
    for (label, value, class) in [
        ("Quizzes Analyzed", analysis.quizzes.len(), ""),
        ("Total Questions", analysis.total_questions(), ""),
        ("Critical Issues", analysis.critical_count(), " critical"),
        ("Total Flags", analysis.total_flags(), " warning"),
    ] {
        html.push_str(&format!(
            "<div class=\"card{class}\"><div class=\"value\">{value}</div><div class=\"label\">{label}</div></div>\n"
        ));
    }
    html.push_str("</section>\n");

    // Quiz table
    html.push_str("<section>\n<h2>Quiz Summary</h2>\n");
    html.push_str("<table id=\"quizzes\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Quiz</th><th onclick=\"sortTable(1)\">Submissions</th><th onclick=\"sortTable(2)\">Mean Score</th><th onclick=\"sortTable(3)\">Flags</th><th onclick=\"sortTable(4)\">Critical</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for quiz in &analysis.quizzes {
        let mean = quiz.summary.scores.as_ref().and_then(|s| s.mean_fraction());
        let row_class = if quiz.summary.critical_flags > 0 {
            "critical"
        } else if quiz.summary.total_flags > 0 {
            "warning"
        } else {
            "good"
        };
        html.push_str(&format!(
            "<tr class=\"{row_class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&quiz.title),
            quiz.submission_count,
            format_percentage(mean),
            quiz.summary.total_flags,
            quiz.summary.critical_flags,
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Charts
    html.push_str("<section class=\"charts\">\n");
    html.push_str("<div>\n<h2>Flags per Quiz</h2>\n");
    html.push_str(&flags_bar_chart(analysis));
    html.push_str("</div>\n");
    html.push_str("<div>\n<h2>Difficulty vs Discrimination</h2>\n");
    html.push_str(&item_scatter_plot(analysis));
    html.push_str("</div>\n");
    html.push_str("</section>\n");

    html.push_str(LEGEND);

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(analysis).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the dashboard to a file.
pub fn write_dashboard(analysis: &SectionAnalysis, semester: Option<&str>, path: &Path) -> Result<()> {
    let html = dashboard_html(analysis, semester);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write dashboard to {}", path.display()))?;
    Ok(())
}

fn flags_bar_chart(analysis: &SectionAnalysis) -> String {
    let bar_height = 24;
    let max_width = 360;
    let padding = 8;
    let label_width = 220;

    let max_flags = analysis
        .quizzes
        .iter()
        .map(|q| q.summary.total_flags)
        .max()
        .unwrap_or(0)
        .max(1);

    let total_height = analysis.quizzes.len() * (bar_height + padding) + padding;
    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, quiz) in analysis.quizzes.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let flags = quiz.summary.total_flags;
        let width = flags * max_width / max_flags;
        let color = if quiz.summary.critical_flags > 0 {
            "#ef4444"
        } else if flags > 0 {
            "#eab308"
        } else {
            "#22c55e"
        };
        let label: String = quiz.title.chars().take(30).collect();

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"13\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{label_width}\" y=\"{y}\" width=\"{width}\" height=\"{bar_height}\" fill=\"{color}\" rx=\"4\"/>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{flags}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const PLOT_WIDTH: f64 = 480.0;
const PLOT_HEIGHT: f64 = 320.0;
const PLOT_MARGIN: f64 = 40.0;
const D_MIN: f64 = -0.5;
const D_MAX: f64 = 1.0;

fn plot_x(p: f64) -> f64 {
    PLOT_MARGIN + p.clamp(0.0, 1.0) * PLOT_WIDTH
}

fn plot_y(d: f64) -> f64 {
    let d = d.clamp(D_MIN, D_MAX);
    PLOT_MARGIN + (D_MAX - d) / (D_MAX - D_MIN) * PLOT_HEIGHT
}

/// Point color of an item on the scatter plot.
fn point_color(p: f64, d: f64) -> &'static str {
    if d < 0.0 {
        "#ef4444"
    } else if !(0.3..=0.9).contains(&p) || d < 0.2 {
        "#eab308"
    } else {
        "#22c55e"
    }
}

/// Every item with both difficulty and discrimination, with the ideal zone
/// (p 0.3-0.7, D >= 0.2) shaded.
fn item_scatter_plot(analysis: &SectionAnalysis) -> String {
    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        PLOT_WIDTH + 2.0 * PLOT_MARGIN,
        PLOT_HEIGHT + 2.0 * PLOT_MARGIN
    );

    // Ideal zone
    svg.push_str(&format!(
        "  <rect class=\"ideal-zone\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#22c55e\" fill-opacity=\"0.12\"/>\n",
        plot_x(0.3),
        plot_y(D_MAX),
        plot_x(0.7) - plot_x(0.3),
        plot_y(0.2) - plot_y(D_MAX)
    ));

    // Axes and zero line
    svg.push_str(&format!(
        "  <rect x=\"{PLOT_MARGIN}\" y=\"{PLOT_MARGIN}\" width=\"{PLOT_WIDTH}\" height=\"{PLOT_HEIGHT}\" fill=\"none\" stroke=\"currentColor\" stroke-opacity=\"0.4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#ef4444\" stroke-dasharray=\"4 4\"/>\n",
        plot_x(0.0),
        plot_x(1.0),
        y = plot_y(0.0)
    ));
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">Difficulty (p)</text>\n",
        PLOT_MARGIN + PLOT_WIDTH / 2.0,
        PLOT_HEIGHT + 2.0 * PLOT_MARGIN - 8.0
    ));
    svg.push_str(&format!(
        "  <text x=\"12\" y=\"{:.1}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\" transform=\"rotate(-90 12 {:.1})\">Discrimination (D)</text>\n",
        PLOT_MARGIN + PLOT_HEIGHT / 2.0,
        PLOT_MARGIN + PLOT_HEIGHT / 2.0
    ));

    for quiz in &analysis.quizzes {
        for (i, q) in quiz.questions.iter().enumerate() {
            let (Some(p), Some(d)) = (q.difficulty, q.discrimination.as_ref().map(|d| d.d)) else {
                continue;
            };
            svg.push_str(&format!(
                "  <circle class=\"item\" cx=\"{:.1}\" cy=\"{:.1}\" r=\"6\" fill=\"{}\" fill-opacity=\"0.8\"><title>{} Q{}: p={}, D={}</title></circle>\n",
                plot_x(p),
                plot_y(d),
                point_color(p, d),
                html_escape(&quiz.title),
                i + 1,
                format_percentage(Some(p)),
                format_decimal(Some(d)),
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}

const LEGEND: &str = r#"<section class="legend">
<h2>Interpretation Guide</h2>
<ul>
<li><span class="dot green"></span><strong>Ideal:</strong> difficulty 30-70%, discrimination above 0.20</li>
<li><span class="dot yellow"></span><strong>Review:</strong> too easy (&gt;90%), too hard (&lt;30%), or poor discrimination (&lt;0.20)</li>
<li><span class="dot red"></span><strong>Critical:</strong> negative discrimination; check the answer key and wording</li>
</ul>
</section>
"#;

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --good: #dcfce7; --warn: #fef9c3; --crit: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --good: #064e3b; --warn: #713f12; --crit: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.cards { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 10rem; }
.card .value { font-size: 2rem; font-weight: bold; }
.card .label { color: #6b7280; }
.card.critical .value { color: #ef4444; }
.card.warning .value { color: #eab308; }
.charts { display: flex; gap: 2rem; flex-wrap: wrap; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
tr.critical { background: var(--crit); }
tr.warning { background: var(--warn); }
tr.good { background: var(--good); }
.dot { display: inline-block; width: 0.8rem; height: 0.8rem; border-radius: 50%; margin-right: 0.5rem; }
.dot.green { background: #22c55e; }
.dot.yellow { background: #eab308; }
.dot.red { background: #ef4444; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('quizzes');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::section_analysis;

    #[test]
    fn escape_special_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom's & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#x27;s &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn dashboard_contains_required_elements() {
        let analysis = section_analysis();
        let html = dashboard_html(&analysis, Some("Spring 2026"));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("spring2026_001 | Spring 2026"));
        assert!(html.contains("Week 2 Quiz"));
        assert!(html.contains("Unreleased &lt;draft&gt;"));
        assert!(!html.contains("Unreleased <draft>"));
        assert!(html.contains("Interpretation Guide"));
        assert!(html.contains("class=\"ideal-zone\""));
    }

    #[test]
    fn scatter_plots_items_with_both_metrics() {
        let analysis = section_analysis();
        let html = dashboard_html(&analysis, None);
        assert_eq!(html.matches("<circle class=\"item\"").count(), 3);
        // The reversed item sits below the zero line.
        assert!(html.contains("fill=\"#ef4444\" fill-opacity=\"0.8\"><title>Week 2 Quiz Q2"));
    }

    #[test]
    fn point_colors() {
        assert_eq!(point_color(0.5, -0.1), "#ef4444");
        assert_eq!(point_color(0.95, 0.5), "#eab308");
        assert_eq!(point_color(0.5, 0.1), "#eab308");
        assert_eq!(point_color(0.5, 0.5), "#22c55e");
        assert_eq!(point_color(0.85, 0.3), "#22c55e");
    }

    #[test]
    fn plot_coordinates_clamp_discrimination() {
        assert_eq!(plot_y(-2.0), plot_y(D_MIN));
        assert_eq!(plot_y(D_MAX), PLOT_MARGIN);
        assert_eq!(plot_x(0.0), PLOT_MARGIN);
    }

    #[test]
    fn dashboard_write_to_file() {
        let analysis = section_analysis();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboards").join("s_dashboard.html");

        write_dashboard(&analysis, None, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
