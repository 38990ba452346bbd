//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// SurveyStat - statistics and charts for survey responses
///
/// Reads a JSON list of questions ({id, text, answers}) and produces
/// frequency charts, Likert comparisons, significance tests and reports.
///
/// Examples:
///   surveystat
///   surveystat --input survey_data.json --output-dir charts/
///   surveystat --mode prototypes --input prototype_survey.json
///   surveystat --format markdown --no-charts
///   surveystat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Which analysis to run
    #[arg(long, default_value = "needfinding", value_name = "MODE")]
    pub mode: AnalysisMode,

    /// Survey JSON file to analyze
    ///
    /// Defaults to survey_data.json, or the [general] input of the config file.
    #[arg(short, long, value_name = "FILE", env = "SURVEYSTAT_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory for charts and reports
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .surveystat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Format of the needfinding summary (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .surveystat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Analysis pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AnalysisMode {
    /// Per-question frequency analysis (default)
    #[default]
    Needfinding,
    /// Likert and ranking comparison of prototypes
    Prototypes,
}

/// Output format for the needfinding summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown format
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
