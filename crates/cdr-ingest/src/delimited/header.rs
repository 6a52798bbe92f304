//! Header parsing and separator detection.

use crate::error::{IngestError, Result};

/// Column that every call-record source starts with.
const LEADING_COLUMN: &str = "filename";

/// Column that follows the leading column in every call-record source.
const SECOND_COLUMN: &str = "date";

/// Default separator when the header splits cleanly on commas.
const DEFAULT_SEPARATOR: u8 = b',';

/// Resolved field separator for a delimited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separator {
    /// Single-byte delimiter handed to the CSV reader.
    pub delimiter: u8,
    /// Whether fields must be trimmed (the header used padding around the delimiter).
    pub trim_fields: bool,
}

impl Separator {
    pub const COMMA: Separator = Separator {
        delimiter: DEFAULT_SEPARATOR,
        trim_fields: false,
    };

    fn from_text(name: &str, text: &str) -> Result<Self> {
        if let [byte] = text.as_bytes() {
            return Ok(Self {
                delimiter: *byte,
                trim_fields: false,
            });
        }
        match text.trim().as_bytes() {
            [byte] => Ok(Self {
                delimiter: *byte,
                trim_fields: true,
            }),
            _ => Err(IngestError::UnsupportedSeparator {
                name: name.to_string(),
                separator: text.to_string(),
            }),
        }
    }
}

/// Normalizes a header value by trimming whitespace.
pub fn normalize_header(value: &str) -> String {
    value.trim().to_string()
}

/// Parses a header line into fields, handling quoted values.
pub fn parse_header_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => {
                in_quotes = true;
            }
            '"' if in_quotes => {
                // Check for escaped quote ("")
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(normalize_header(&current));
                current.clear();
            }
            _ => {
                current.push(c);
            }
        }
    }

    fields.push(normalize_header(&current));
    fields
}

/// Detects the separator from the header line of a delimited source.
///
/// The header is first split on commas. When that yields one column whose
/// lower-cased text is not exactly `filename`, the separator is whatever sits
/// between the `filename` prefix and the first `date`.
pub fn detect_separator(name: &str, header_line: &str) -> Result<Separator> {
    let columns = parse_header_line(header_line, char::from(DEFAULT_SEPARATOR));
    let [single] = columns.as_slice() else {
        return Ok(Separator::COMMA);
    };
    let lowered = single.to_ascii_lowercase();
    if lowered == LEADING_COLUMN {
        return Ok(Separator::COMMA);
    }

    let undetected = || IngestError::SeparatorUndetected {
        name: name.to_string(),
        header: single.clone(),
    };
    if !lowered.starts_with(LEADING_COLUMN) {
        return Err(undetected());
    }
    let offset = LEADING_COLUMN.len();
    let end = lowered[offset..]
        .find(SECOND_COLUMN)
        .map(|pos| offset + pos)
        .ok_or_else(undetected)?;
    let separator = &single[offset..end];
    if separator.is_empty() {
        return Err(undetected());
    }

    let resolved = Separator::from_text(name, separator)?;
    tracing::debug!(
        file = %name,
        separator = %char::from(resolved.delimiter).escape_default(),
        "detected non-default separator"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  hello  "), "hello");
        assert_eq!(normalize_header("hello"), "hello");
    }

    #[test]
    fn test_parse_header_line_simple() {
        let result = parse_header_line("a,b,c", ',');
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_header_line_quoted() {
        let result = parse_header_line("\"hello, world\",b,c", ',');
        assert_eq!(result, vec!["hello, world", "b", "c"]);
    }

    #[test]
    fn test_parse_header_line_escaped_quotes() {
        let result = parse_header_line("\"he said \"\"hello\"\"\",b", ',');
        assert_eq!(result, vec!["he said \"hello\"", "b"]);
    }

    #[test]
    fn test_parse_header_line_other_delimiter() {
        let result = parse_header_line("a;b;c", ';');
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_detect_comma() {
        let sep = detect_separator("a.csv", "filename,date,phone_number_client").unwrap();
        assert_eq!(sep, Separator::COMMA);
    }

    #[test]
    fn test_detect_semicolon() {
        let sep = detect_separator("a.csv", "filename;date;phone_number_client;type").unwrap();
        assert_eq!(sep.delimiter, b';');
        assert!(!sep.trim_fields);
    }

    #[test]
    fn test_detect_tab() {
        let sep = detect_separator("a.csv", "filename\tdate\tstatus").unwrap();
        assert_eq!(sep.delimiter, b'\t');
    }

    #[test]
    fn test_detect_case_insensitive() {
        let sep = detect_separator("a.csv", "FileName|Date|Status").unwrap();
        assert_eq!(sep.delimiter, b'|');
    }

    #[test]
    fn test_detect_padded_separator() {
        let sep = detect_separator("a.csv", "filename ; date ; status").unwrap();
        assert_eq!(sep.delimiter, b';');
        assert!(sep.trim_fields);
    }

    #[test]
    fn test_single_filename_column_uses_comma() {
        let sep = detect_separator("a.csv", "Filename").unwrap();
        assert_eq!(sep, Separator::COMMA);
    }

    #[test]
    fn test_detect_without_date_fails() {
        let result = detect_separator("a.csv", "filename;status");
        assert!(matches!(
            result,
            Err(IngestError::SeparatorUndetected { .. })
        ));
    }

    #[test]
    fn test_detect_without_filename_prefix_fails() {
        let result = detect_separator("a.csv", "id;date");
        assert!(matches!(
            result,
            Err(IngestError::SeparatorUndetected { .. })
        ));
    }

    #[test]
    fn test_detect_multi_byte_separator_fails() {
        let result = detect_separator("a.csv", "filename::date::status");
        assert!(matches!(
            result,
            Err(IngestError::UnsupportedSeparator { .. })
        ));
    }
}
