pub mod analyze;
pub mod compare;
pub mod init;
pub mod report;
pub mod validate;

use anyhow::Result;

use quizstat_core::config::AnalysisConfig;

/// Sections a command should act on.
///
/// `--all` means every configured course, or every subdirectory of the raw
/// data directory when no courses are configured.
pub fn resolve_sections(
    section: Option<String>,
    all: bool,
    config: &AnalysisConfig,
) -> Result<Vec<String>> {
    if let Some(section) = section {
        return Ok(vec![section]);
    }
    anyhow::ensure!(all, "specify a section or use --all");

    if !config.courses.is_empty() {
        tracing::debug!("using {} configured sections", config.courses.len());
        return Ok(config.courses.keys().cloned().collect());
    }

    let raw = &config.paths.raw_data;
    let mut sections = Vec::new();
    if raw.is_dir() {
        for entry in std::fs::read_dir(raw)? {
            let path = entry?.path();
            if path.is_dir() {
                if let Some(name) = path.file_name() {
                    sections.push(name.to_string_lossy().into_owned());
                }
            }
        }
    }
    sections.sort();
    tracing::debug!("found {} sections under {}", sections.len(), raw.display());
    anyhow::ensure!(
        !sections.is_empty(),
        "no sections configured and no section data found in {}",
        raw.display()
    );
    Ok(sections)
}
