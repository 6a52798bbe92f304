//! Error taxonomy for pipeline runs and call lookups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cdr_ingest::IngestError;
use cdr_model::Column;

use crate::remote::RemoteError;

/// Coarse error classification returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    Parse,
    Schema,
    NotFound,
    RemoteUnavailable,
    Config,
    Persistence,
    Internal,
}

/// Errors produced by the pipeline and the call service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A source file has an unrecognized extension.
    #[error("unsupported file format: {name}")]
    UnsupportedFormat { name: String },

    /// A source file of a recognized format has malformed content.
    #[error("failed to parse {name}: {message}")]
    Parse { name: String, message: String },

    /// A date cell could not be read as a timestamp.
    #[error("unrecognized timestamp '{value}'")]
    InvalidDate { value: String },

    /// An expected column is absent from every source.
    #[error("required column '{column}' is missing from all sources")]
    Schema { column: Column },

    /// A requested call (or call index) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The call exists but no audio asset matched its filename.
    #[error("call_id={id} has no recording")]
    NoRecording { id: String },

    /// Listing or fetching from the remote store failed.
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Settings failed validation or could not be loaded.
    #[error("invalid settings: {0}")]
    Config(String),

    /// Reading or writing a cache snapshot failed.
    #[error("cache snapshot error: {0}")]
    Snapshot(String),

    /// A resolution worker panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Classifies this error for structured reporting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Parse { .. } | Self::InvalidDate { .. } => ErrorKind::Parse,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::NotFound(_) | Self::NoRecording { .. } => ErrorKind::NotFound,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::Config(_) => ErrorKind::Config,
            Self::Snapshot(_) => ErrorKind::Persistence,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns a user-friendly message that exposes no internal state.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::UnsupportedFormat { .. } => "A data file has an unsupported format.",
            Self::Parse { .. } | Self::InvalidDate { .. } => "A data file could not be read.",
            Self::Schema { .. } => "The data files are missing required columns.",
            Self::NotFound(_) => "The requested call was not found.",
            Self::NoRecording { .. } => "No recording is available for this call.",
            Self::RemoteUnavailable(_) => "Could not reach the file storage. Please try again.",
            Self::Config(_) => "The configuration is invalid.",
            Self::Snapshot(_) | Self::Internal(_) => "An unexpected error occurred.",
        }
    }

    /// Builds the structured description handed to callers.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}

impl From<IngestError> for CoreError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedFormat { name } => Self::UnsupportedFormat { name },
            IngestError::EmptySource { ref name }
            | IngestError::SeparatorUndetected { ref name, .. }
            | IngestError::UnsupportedSeparator { ref name, .. }
            | IngestError::Csv { ref name, .. }
            | IngestError::Spreadsheet { ref name, .. }
            | IngestError::NoSheet { ref name } => Self::Parse {
                name: name.clone(),
                message: err.to_string(),
            },
        }
    }
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        Self::RemoteUnavailable(err.to_string())
    }
}

/// Error kind plus human-readable detail, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub detail: String,
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, CoreError>;
