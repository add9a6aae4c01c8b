//! Error types for bundling operations.
//!
//! Every failure a bundler can produce is classified into one of the categories
//! exposed by [`ErrorKind`]: configuration problems (fixable by changing
//! parameters), unsupported platforms (not fixable by parameters), I/O faults
//! and native tool failures. Configuration and platform errors carry a
//! corrective suggestion alongside the message.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as DeriveError;

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a bundler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// User-supplied values failed validation.
    Configuration,
    /// The format cannot be produced on this host or toolchain.
    UnsupportedPlatform,
    /// Staging, rendering or artifact collection hit a filesystem error.
    Io,
    /// The native packaging tool failed or could not be started.
    NativeTool,
    /// Anything else, usually a bundler bug.
    Internal,
}

/// Errors returned by the bundler.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// Invalid or contradictory parameters.
    #[error("{message}")]
    Config {
        /// What is wrong.
        message: String,
        /// How to fix it.
        advice: String,
    },

    /// The requested format cannot run on this host.
    #[error("{message}")]
    UnsupportedPlatform {
        /// What is missing.
        message: String,
        /// What the user can do about it.
        advice: String,
    },

    /// Error with additional context.
    #[error("{0}: {1}")]
    Context(String, Box<Error>),

    /// Raw I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Filesystem error tied to a path.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// The action being performed.
        context: String,
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Directory traversal failure.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping failure.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Invalid resource glob pattern.
    #[error("invalid resource pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// A native tool could not be started.
    #[error("failed to run {command}: {error}")]
    CommandFailed {
        /// The command name.
        command: String,
        /// The spawn error.
        error: io::Error,
    },

    /// A native tool exited unsuccessfully.
    #[error("{tool} failed with exit code {}", exit_label(.code))]
    ToolFailed {
        /// The tool name.
        tool: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured stdout and stderr.
        output: String,
    },

    /// A template could not be located or rendered.
    #[error("template {name}: {reason}")]
    Template {
        /// Template name.
        name: String,
        /// Failure reason.
        reason: String,
    },

    /// The native tool reported success but produced nothing.
    #[error("no .{extension} artifact found in {}", .dir.display())]
    ArtifactNotFound {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Expected extension.
        extension: String,
    },

    /// Generic error.
    #[error("{0}")]
    GenericError(String),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
}

impl Error {
    /// Creates a configuration error with a corrective suggestion.
    pub fn config(message: impl Into<String>, advice: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            advice: advice.into(),
        }
    }

    /// Creates an unsupported-platform error with a corrective suggestion.
    pub fn unsupported(message: impl Into<String>, advice: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            message: message.into(),
            advice: advice.into(),
        }
    }

    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Configuration,
            Self::UnsupportedPlatform { .. } => ErrorKind::UnsupportedPlatform,
            Self::Context(_, inner) => inner.kind(),
            Self::IoError(_)
            | Self::Fs { .. }
            | Self::WalkDir(_)
            | Self::StripPrefix(_)
            | Self::Template { .. }
            | Self::ArtifactNotFound { .. } => ErrorKind::Io,
            Self::CommandFailed { .. } | Self::ToolFailed { .. } => ErrorKind::NativeTool,
            Self::Glob(_) => ErrorKind::Configuration,
            Self::GenericError(_) => ErrorKind::Internal,
        }
    }

    /// Returns the corrective suggestion, if this error carries one.
    pub fn advice(&self) -> Option<&str> {
        match self {
            Self::Config { advice, .. } | Self::UnsupportedPlatform { advice, .. } => {
                Some(advice.as_str())
            }
            Self::Context(_, inner) => inner.advice(),
            _ => None,
        }
    }

    /// Returns captured native tool output, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { output, .. } => Some(output.as_str()),
            Self::Context(_, inner) => inner.tool_output(),
            _ => None,
        }
    }
}

/// Adds context to results and options, converting them into [`Error`].
pub trait Context<T> {
    /// Wraps the error with a context message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error with a lazily evaluated context message.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attaches a path and action to I/O errors.
pub trait ErrorExt<T> {
    /// Converts an I/O error into [`Error::Fs`].
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Returns early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_kind_and_advice() {
        let err: Result<()> = Err(Error::config("bad name", "rename it"));
        let wrapped = err.context("validating rpm").unwrap_err();
        assert_eq!(wrapped.kind(), ErrorKind::Configuration);
        assert_eq!(wrapped.advice(), Some("rename it"));
        assert!(wrapped.to_string().starts_with("validating rpm: bad name"));
    }

    #[test]
    fn tool_failure_is_native_tool_kind() {
        let err = Error::ToolFailed {
            tool: "rpmbuild".into(),
            code: Some(1),
            output: "error: bad spec".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NativeTool);
        assert_eq!(err.tool_output(), Some("error: bad spec"));
        assert_eq!(err.to_string(), "rpmbuild failed with exit code 1");
    }

    #[test]
    fn fs_context_reports_path() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = res.fs_context("reading template", "/tmp/x.spec").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "reading template /tmp/x.spec: gone");
    }
}
