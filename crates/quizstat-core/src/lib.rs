//! quizstat-core: Item-analysis engine, data model, and section analysis.
//!
//! This crate holds the statistics every other quizstat crate builds on:
//! difficulty, discrimination, distractor breakdowns, point-biserial
//! correlation, and the threshold evaluator that turns them into flags.

pub mod analysis;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod loader;
pub mod model;
pub mod report;
pub mod statistics;
