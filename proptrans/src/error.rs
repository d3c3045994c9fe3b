//! All error types for the proptrans crate.
//!
//! [`Error`] is returned from fallible invocation-level operations (decoding,
//! configuration, aborting a run). Failures scoped to one translation unit are
//! not errors of the invocation; they travel as [`ProviderError`] values inside
//! the final report.

use std::{fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid locale `{0}`")]
    InvalidLocale(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    #[error("aborted: cannot read source `{}`: {source}", path.display())]
    Aborted {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a new format error for the given 1-based line.
    pub fn format_error(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }

    /// Wraps a source-file failure into the error that ends an invocation.
    pub fn aborted(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::Aborted {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// Classification of a failed translation unit.
///
/// The first five kinds are produced by providers. `Timeout` and `Cancelled`
/// are assigned by the orchestrator when it gives up on a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkError,
    RateLimited,
    UnsupportedLocale,
    EmptyInput,
    ProviderError,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "network_error",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UnsupportedLocale => "unsupported_locale",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure returned by a translation provider.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ProviderError {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn unsupported_locale(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedLocale, message)
    }
}
