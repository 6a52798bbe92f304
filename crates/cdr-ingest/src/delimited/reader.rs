//! Delimited-text parsing into typed records.

use std::borrow::Cow;
use std::collections::BTreeSet;

use cdr_model::{Column, Record, RecordSet};
use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1251;

use crate::error::{IngestError, Result};

use super::header::detect_separator;

/// Decodes source bytes as UTF-8 (BOM stripped), falling back to Windows-1251.
///
/// Call exports from telephony systems are frequently saved in the legacy
/// Cyrillic code page.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, had_errors) = WINDOWS_1251.decode(bytes);
            if had_errors {
                tracing::warn!("source is neither UTF-8 nor Windows-1251; replaced invalid bytes");
            }
            text
        }
    }
}

/// Parses a delimited-text source into a record set.
///
/// The header line is read first to resolve the separator; the full text is
/// then parsed with it. Rows whose field count differs from the header are
/// rejected so a malformed file never yields a partial record set.
pub fn parse_delimited(name: &str, bytes: &[u8]) -> Result<RecordSet> {
    let text = decode_text(bytes);
    let header_line = text
        .lines()
        .next()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| IngestError::EmptySource {
            name: name.to_string(),
        })?;
    let separator = detect_separator(name, header_line)?;

    let csv_error = |err: csv::Error| IngestError::Csv {
        name: name.to_string(),
        message: err.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(separator.delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(if separator.trim_fields {
            Trim::All
        } else {
            Trim::None
        })
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    let mapping: Vec<Option<Column>> = headers.iter().map(Column::from_header).collect();
    let columns: BTreeSet<Column> = mapping.iter().flatten().copied().collect();
    let ignored = mapping.iter().filter(|column| column.is_none()).count();
    if ignored > 0 {
        tracing::debug!(file = %name, ignored, "ignoring unexpected columns");
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let mut record = Record::default();
        for (column, value) in mapping.iter().zip(row.iter()) {
            if let Some(column) = column {
                record.set_text(*column, value);
            }
        }
        records.push(record);
    }

    tracing::debug!(
        file = %name,
        rows = records.len(),
        columns = columns.len(),
        "parsed delimited source"
    );
    Ok(RecordSet::new(columns, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdr_model::CellValue;

    #[test]
    fn test_parse_comma_source() {
        let source = "filename,date,phone_number_client,phone_number_operator,type,status,duration_answer\n\
                      a.wav,2023-01-01 10:00:00,555,101,incoming,answered,30\n";
        let set = parse_delimited("calls.csv", source.as_bytes()).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.columns.len(), 7);
        let record = &set.records[0];
        assert_eq!(record.filename.as_deref(), Some("a.wav"));
        assert_eq!(record.date.as_deref(), Some("2023-01-01 10:00:00"));
        assert_eq!(
            record.phone_number_client,
            Some(CellValue::Text("555".to_string()))
        );
        assert_eq!(record.duration_answer, Some(CellValue::Int(30)));
    }

    #[test]
    fn test_parse_semicolon_source() {
        let source = "filename;date;phone_number_client;status\n\
                      a.wav;2023-01-01;555;answered\n\
                      b.wav;2023-01-02;556;missed\n";
        let set = parse_delimited("calls.csv", source.as_bytes()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.records[1].filename.as_deref(), Some("b.wav"));
        assert_eq!(
            set.records[1].status,
            Some(CellValue::Text("missed".to_string()))
        );
        assert!(!set.has_column(Column::Type));
    }

    #[test]
    fn test_parse_padded_separator() {
        let source = "filename ; date ; status\na.wav ; 2023-01-01 ; ok\n";
        let set = parse_delimited("calls.csv", source.as_bytes()).unwrap();

        assert_eq!(set.records[0].date.as_deref(), Some("2023-01-01"));
        assert_eq!(
            set.records[0].status,
            Some(CellValue::Text("ok".to_string()))
        );
    }

    #[test]
    fn test_parse_with_bom_and_crlf() {
        let source = "\u{feff}filename,date\r\na.wav,2023-01-01\r\n";
        let set = parse_delimited("calls.csv", source.as_bytes()).unwrap();

        assert!(set.has_column(Column::Filename));
        assert_eq!(set.records[0].date.as_deref(), Some("2023-01-01"));
    }

    #[test]
    fn test_parse_header_only() {
        let set = parse_delimited("calls.csv", b"filename,date\n").unwrap();
        assert!(set.is_empty());
        assert!(set.has_column(Column::Date));
    }

    #[test]
    fn test_parse_empty_source() {
        let result = parse_delimited("calls.csv", b"");
        assert!(matches!(result, Err(IngestError::EmptySource { .. })));
    }

    #[test]
    fn test_parse_ragged_row_fails() {
        let source = "filename,date,status\na.wav,2023-01-01\n";
        let result = parse_delimited("calls.csv", source.as_bytes());
        assert!(matches!(result, Err(IngestError::Csv { .. })));
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let source = "filename,date,comment\na.wav,2023-01-01,hello\n";
        let set = parse_delimited("calls.csv", source.as_bytes()).unwrap();
        assert_eq!(set.columns.len(), 2);
    }

    #[test]
    fn test_decode_windows_1251() {
        // "Иван" in Windows-1251
        let bytes = [0xC8, 0xE2, 0xE0, 0xED];
        assert_eq!(decode_text(&bytes), "Иван");
    }

    #[test]
    fn test_decode_utf8_passthrough() {
        assert_eq!(decode_text("Иван".as_bytes()), "Иван");
    }
}
