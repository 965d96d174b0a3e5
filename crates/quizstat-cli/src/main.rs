//! quizstat CLI: item analysis of course quizzes.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizstat", version, about = "Item analysis for course quizzes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze quiz performance for a section
    Analyze {
        /// Section key (e.g. spring2026_001)
        section: Option<String>,

        /// Analyze every known section
        #[arg(long, conflicts_with = "section")]
        all: bool,

        /// Also render reports and the dashboard
        #[arg(long)]
        full: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render Markdown reports and the dashboard from a saved analysis
    Report {
        /// Section key
        section: Option<String>,

        /// Report on every known section
        #[arg(long, conflicts_with = "section")]
        all: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two saved analyses
    Compare {
        /// Baseline analysis JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current analysis JSON
        #[arg(long)]
        current: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Exit code 1 if any question got worse
        #[arg(long)]
        fail_on_escalation: bool,
    },

    /// Check a section's raw data for problems
    Validate {
        /// Section key
        section: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizstat=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            section,
            all,
            full,
            config,
        } => commands::analyze::execute(section, all, full, config),
        Commands::Report {
            section,
            all,
            config,
        } => commands::report::execute(section, all, config),
        Commands::Compare {
            baseline,
            current,
            format,
            fail_on_escalation,
        } => commands::compare::execute(baseline, current, format, fail_on_escalation),
        Commands::Validate { section, config } => commands::validate::execute(section, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
