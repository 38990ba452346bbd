//! Typed errors for loading surveys and running statistical tests.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a survey file.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("failed to read survey file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse survey file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("survey file {0} contains no questions")]
    Empty(PathBuf),
}

/// Errors raised by the hypothesis tests.
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("sample '{0}' is empty")]
    EmptySample(String),

    #[error("invalid degrees of freedom: {0}")]
    DegreesOfFreedom(f64),
}
