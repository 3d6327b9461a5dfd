//! Error types for the adflow pipeline.
//!
//! Item-level problems are never `Err`: they are classified into a
//! [`FailureKind`] and carried as a [`StageFailure`] value so the runner can
//! count them and move on. `Err` is reserved for stage-level conditions
//! (unreadable stores, broken config, export I/O) and the single fatal
//! condition of a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for adflow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// An artifact or catalog store could not be read or written.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The export collaborator failed.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// A remote call or collaborator client failed.
    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    /// Import failed and no catalog exists to fall back on.
    #[error("No products to work with: {0}")]
    NoCatalog(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the JSON-file backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted collection exists but cannot be parsed.
    #[error("Corrupt store at {}: {reason}", path.display())]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Reading or writing the store failed.
    #[error("Store IO error at {}: {source}", path.display())]
    Io {
        /// The offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The in-memory collection could not be serialized.
    #[error("Failed to serialize store {}: {reason}", path.display())]
    Serialize {
        /// The offending file.
        path: PathBuf,
        /// Serializer message.
        reason: String,
    },
}

impl StoreError {
    /// Returns true if the store file exists but is unreadable as JSON.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but cannot be read.
    #[error("Cannot read config file {}: {source}", path.display())]
    Read {
        /// The offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid JSON for its schema.
    #[error("Invalid config file {}: {reason}", path.display())]
    Parse {
        /// The offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// Errors raised by an export collaborator.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing an export file failed.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The export payload could not be serialized.
    #[error("Export serialization error: {0}")]
    Serialize(String),
}

/// Error returned by a remote collaborator (text, image, video, feed).
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The request never produced a response (DNS, connect, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request exceeded its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The remote answered with a non-success status.
    #[error("Remote returned status {status}: {message}")]
    Status {
        /// HTTP-like status code.
        status: u16,
        /// Retry-after hint, when the remote supplied one.
        retry_after: Option<Duration>,
        /// Body or reason phrase.
        message: String,
    },

    /// The remote answered, but the payload is unusable.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Creates a status error without a retry hint.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            retry_after: None,
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns the status code, if the remote sent one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the retry-after hint, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Classifies the error into the failure taxonomy.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::TransportError,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Malformed(_) => FailureKind::MalformedResponse,
            Self::Status { status, .. } => match status {
                408 | 429 | 500..=599 => FailureKind::TransportError,
                _ => FailureKind::RemoteRejected,
            },
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(Duration::ZERO);
        }
        if err.is_decode() {
            return Self::Malformed(err.to_string());
        }
        match err.status() {
            Some(status) => Self::status(status.as_u16(), err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}

/// Classification of an item-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network fault or transient remote status; retry on the next run.
    TransportError,
    /// The remote returned an unparsable or unexpected payload.
    MalformedResponse,
    /// The remote reported a semantic failure (e.g. render failed).
    RemoteRejected,
    /// A bounded wait was exceeded.
    Timeout,
    /// Anything else, including panics inside an executor.
    Unexpected,
}

impl FailureKind {
    /// Returns true if rerunning the stage is likely to succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportError | Self::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportError => write!(f, "transport_error"),
            Self::MalformedResponse => write!(f, "malformed_response"),
            Self::RemoteRejected => write!(f, "remote_rejected"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// A classified item failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct StageFailure {
    /// The failure class.
    pub kind: FailureKind,
    /// What went wrong.
    pub message: String,
}

impl StageFailure {
    /// Creates a new failure.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a malformed-response failure.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, message)
    }

    /// Creates an unexpected failure.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unexpected, message)
    }
}

impl From<RemoteError> for StageFailure {
    fn from(err: RemoteError) -> Self {
        Self::new(err.failure_kind(), err.to_string())
    }
}
