//! Error types for logcensor.
//!
//! This module defines all error types used throughout the logcensor crate,
//! providing enough context (file path, stream side, phase) to diagnose a
//! failed censoring run.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which end of a censoring stream an I/O failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSide {
    /// The byte source being censored.
    Source,
    /// The byte sink receiving censored output.
    Sink,
}

impl fmt::Display for StreamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Sink => write!(f, "sink"),
        }
    }
}

/// A single file that could not be censored during a run.
#[derive(Debug)]
pub struct FileFailure {
    /// The file that failed.
    pub path: PathBuf,
    /// Why it failed.
    pub error: Error,
}

/// The main error type for logcensor operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// A configured target location does not exist.
    #[error("censoring target does not exist: {path}")]
    TargetNotFound {
        /// The missing target.
        path: PathBuf,
    },

    /// A secret-source directory or one of its files could not be read.
    #[error("failed to read secrets from {path}: {source}")]
    SecretSource {
        /// Path of the directory or file that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The loaded secrets could not be compiled into a matcher.
    #[error("failed to build secret matcher: {source}")]
    SecretMatcher {
        /// The underlying error.
        #[source]
        source: aho_corasick::BuildError,
    },

    // === Censoring Errors ===
    /// Reading the source or writing the sink failed mid-censor.
    #[error("{side} I/O failed while censoring: {source}")]
    Stream {
        /// Which side of the stream failed.
        side: StreamSide,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Walking a target directory failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        /// The directory being walked.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: walkdir::Error,
    },

    /// The temporary output could not be created or swapped over the original.
    #[error("failed to replace {path} with censored content: {source}")]
    Replace {
        /// The file being replaced.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A per-file failure, tagged with the file it happened on.
    #[error("failed to censor {path}: {source}")]
    File {
        /// The file being censored.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },

    /// One or more files failed while others may have succeeded.
    #[error(
        "{} of {total} file(s) failed to censor: {}",
        .failures.len(),
        summarize(.failures)
    )]
    PartialRun {
        /// Every failed file, in resolution order.
        failures: Vec<FileFailure>,
        /// Number of files the run attempted.
        total: usize,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for logcensor operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn summarize(failures: &[FileFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a source-side stream error from a failed read.
    #[must_use]
    pub fn read(err: std::io::Error) -> Self {
        Self::Stream {
            side: StreamSide::Source,
            source: err,
        }
    }

    /// Create a sink-side stream error from a failed write.
    #[must_use]
    pub fn write(err: std::io::Error) -> Self {
        Self::Stream {
            side: StreamSide::Sink,
            source: err,
        }
    }

    /// Attach the file being censored to this error.
    #[must_use]
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error means the run was misconfigured and never started.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad(_)
                | Self::ConfigValidation { .. }
                | Self::TargetNotFound { .. }
                | Self::SecretSource { .. }
                | Self::SecretMatcher { .. }
        )
    }

    /// The stream side that failed, looking through per-file wrappers.
    #[must_use]
    pub fn stream_side(&self) -> Option<StreamSide> {
        match self {
            Self::Stream { side, .. } => Some(*side),
            Self::File { source, .. } => source.stream_side(),
            _ => None,
        }
    }
}
