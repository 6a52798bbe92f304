//! Error types for call-record ingestion.

use thiserror::Error;

/// Errors that can occur while parsing one source file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Format Errors ===
    /// File name does not carry a supported extension.
    #[error("unsupported file format: {name}")]
    UnsupportedFormat { name: String },

    // === Delimited Text Errors ===
    /// Source has no header line.
    #[error("source file is empty: {name}")]
    EmptySource { name: String },

    /// Header is a single column that does not reveal a separator.
    #[error("could not detect separator in {name} from header '{header}'")]
    SeparatorUndetected { name: String, header: String },

    /// Detected separator cannot be used as a single-byte delimiter.
    #[error("unsupported separator '{separator}' in {name}")]
    UnsupportedSeparator { name: String, separator: String },

    /// Malformed delimited content.
    #[error("failed to parse CSV {name}: {message}")]
    Csv { name: String, message: String },

    // === Spreadsheet Errors ===
    /// Malformed workbook content.
    #[error("failed to read spreadsheet {name}: {message}")]
    Spreadsheet { name: String, message: String },

    /// Workbook has no sheets.
    #[error("spreadsheet {name} has no sheets")]
    NoSheet { name: String },
}

impl IngestError {
    /// True when the failure is the file's extension rather than its content.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
