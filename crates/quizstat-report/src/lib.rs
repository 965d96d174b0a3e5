//! quizstat-report: Markdown and HTML rendering of section analyses.

pub mod html;
pub mod markdown;

#[cfg(test)]
pub(crate) mod fixtures;
