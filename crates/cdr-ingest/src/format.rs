//! Source format classification by file name.

use cdr_model::RecordSet;

use crate::delimited::parse_delimited;
use crate::error::{IngestError, Result};
use crate::spreadsheet::parse_spreadsheet;

/// Tabular format of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text (`.csv`).
    Delimited,
    /// Workbook (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`).
    Spreadsheet,
}

impl SourceFormat {
    /// Classifies a file by the suffix after its last dot.
    pub fn detect(name: &str) -> Result<Self> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if extension == "csv" {
            Ok(Self::Delimited)
        } else if extension.starts_with("xls") {
            Ok(Self::Spreadsheet)
        } else {
            Err(IngestError::UnsupportedFormat {
                name: name.to_string(),
            })
        }
    }
}

/// Parses one source file, routing by its name.
pub fn parse_source(name: &str, bytes: &[u8]) -> Result<RecordSet> {
    match SourceFormat::detect(name)? {
        SourceFormat::Delimited => parse_delimited(name, bytes),
        SourceFormat::Spreadsheet => parse_spreadsheet(name, bytes),
    }
}
