//! Call-record ingestion utilities.
//!
//! This crate turns the bytes of one remote source file into a
//! [`RecordSet`](cdr_model::RecordSet).
//!
//! # Features
//!
//! - **Format Detection**: `.csv` is delimited text, `.xls*` is a spreadsheet
//! - **Separator Sniffing**: recovers the delimiter from a `filename<sep>date` header
//! - **Spreadsheet Loading**: first sheet only, same expected columns as CSV
//!
//! # Example
//!
//! ```ignore
//! use cdr_ingest::parse_source;
//!
//! let bytes = std::fs::read("calls.csv")?;
//! let records = parse_source("calls.csv", &bytes)?;
//! ```

mod delimited;
mod error;
mod format;
mod spreadsheet;

// === Error Types ===
pub use error::{IngestError, Result};

// === Format Detection ===
pub use format::{SourceFormat, parse_source};

// === Delimited Text ===
pub use delimited::{Separator, decode_text, detect_separator, parse_delimited};

// === Spreadsheets ===
pub use spreadsheet::{excel_serial_to_datetime, parse_spreadsheet};
