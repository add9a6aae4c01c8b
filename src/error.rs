//! Error types for the command line front end.
//!
//! Library code reports [`crate::bundler::Error`]; this module wraps it
//! together with argument, config file and serialization failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Output failures at the binary edge, with context
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A `--set` or `--unset` names the same key twice in conflicting ways
    #[error("Conflicting arguments: {arguments:?}")]
    ConflictingArguments {
        /// Arguments that conflict
        arguments: Vec<String>,
    },

    /// The parameter file could not be read
    #[error("Cannot read config file {}: {reason}", .path.display())]
    ConfigFile {
        /// Path given with `--config`
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Bundler(e) => match e.advice() {
                Some(advice) => vec![advice.to_string()],
                None => Vec::new(),
            },
            BundlerError::Cli(CliError::ConflictingArguments { .. }) => {
                vec!["Pass each parameter to either --set or --unset, not both".to_string()]
            }
            BundlerError::Cli(CliError::ConfigFile { .. }) | BundlerError::Toml(_) => vec![
                "Parameters belong in a [params] table, e.g. appName = \"Hello\"".to_string(),
            ],
            BundlerError::Cli(CliError::InvalidArguments { .. }) => {
                vec!["Run with --help to see the accepted arguments".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundler_advice_becomes_a_suggestion() {
        let err = BundlerError::from(crate::bundler::Error::config(
            "Invalid RPM package name",
            "Use letters and digits.",
        ));
        assert_eq!(err.recovery_suggestions(), vec!["Use letters and digits."]);
    }

    #[test]
    fn output_failures_keep_their_context() {
        use anyhow::Context as _;

        let failed: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"));
        let err = BundlerError::from(failed.context("Failed to write output to stdout").unwrap_err());
        assert_eq!(err.to_string(), "Failed to write output to stdout: pipe closed");
        assert_eq!(err.recovery_suggestions().len(), 1);
    }
}
