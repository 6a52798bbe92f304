//! Parsed rows and the fixed set of expected columns.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed cell value read from a source file.
///
/// Serialized untagged so numbers stay numbers in JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Infers a typed value from delimited-text input.
    ///
    /// Empty input yields `None`. Integers without a redundant leading zero
    /// become `Int`, other plain decimal numbers become `Float`, everything
    /// else stays `Text`.
    pub fn infer(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if looks_numeric(trimmed) {
            let digits = trimmed.trim_start_matches(['-', '+']);
            let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.contains('.');
            if !leading_zero {
                if let Ok(value) = trimmed.parse::<i64>() {
                    return Some(Self::Int(value));
                }
                if let Ok(value) = trimmed.parse::<f64>() {
                    if value.is_finite() {
                        return Some(Self::Float(value));
                    }
                }
            }
        }
        Some(Self::Text(trimmed.to_string()))
    }

    /// Renders the value as text without float noise for whole numbers.
    pub fn render(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) => render_float(*value),
            Self::Bool(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn looks_numeric(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

fn render_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Canonical text form of a phone number cell.
///
/// Whole numbers lose any float formatting (`555.0` becomes `555`), text is
/// trimmed, and a missing value becomes the empty string.
pub fn canonical_phone(value: Option<&CellValue>) -> String {
    match value {
        None => String::new(),
        Some(CellValue::Text(text)) => {
            let trimmed = text.trim();
            match trimmed.split_once('.') {
                Some((whole, fraction))
                    if !whole.is_empty()
                        && whole.chars().all(|c| c.is_ascii_digit())
                        && !fraction.is_empty()
                        && fraction.chars().all(|c| c == '0') =>
                {
                    whole.to_string()
                }
                _ => trimmed.to_string(),
            }
        }
        Some(other) => other.render(),
    }
}

/// The expected columns of a call-record source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Filename,
    Date,
    PhoneNumberClient,
    PhoneNumberOperator,
    Type,
    Status,
    DurationAnswer,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Filename,
        Column::Date,
        Column::PhoneNumberClient,
        Column::PhoneNumberOperator,
        Column::Type,
        Column::Status,
        Column::DurationAnswer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Column::Filename => "filename",
            Column::Date => "date",
            Column::PhoneNumberClient => "phone_number_client",
            Column::PhoneNumberOperator => "phone_number_operator",
            Column::Type => "type",
            Column::Status => "status",
            Column::DurationAnswer => "duration_answer",
        }
    }

    /// Matches a header cell against the expected column names (ASCII case-insensitive).
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.as_str().eq_ignore_ascii_case(header))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call-data row as read from a source file.
///
/// Every field is optional: a source may lack a column, or a cell may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub filename: Option<String>,
    /// Raw timestamp text as it appeared in the source.
    pub date: Option<String>,
    pub phone_number_client: Option<CellValue>,
    pub phone_number_operator: Option<CellValue>,
    #[serde(rename = "type")]
    pub call_type: Option<CellValue>,
    pub status: Option<CellValue>,
    pub duration_answer: Option<CellValue>,
}

impl Record {
    /// Stores a delimited-text cell under `column`.
    ///
    /// Identity columns (filename, date, phones) keep their text verbatim;
    /// the remaining columns are type-inferred.
    pub fn set_text(&mut self, column: Column, raw: &str) {
        let trimmed = raw.trim();
        let text = (!trimmed.is_empty()).then(|| trimmed.to_string());
        match column {
            Column::Filename => self.filename = text,
            Column::Date => self.date = text,
            Column::PhoneNumberClient => self.phone_number_client = text.map(CellValue::Text),
            Column::PhoneNumberOperator => self.phone_number_operator = text.map(CellValue::Text),
            Column::Type => self.call_type = CellValue::infer(trimmed),
            Column::Status => self.status = CellValue::infer(trimmed),
            Column::DurationAnswer => self.duration_answer = CellValue::infer(trimmed),
        }
    }

    /// Stores an already-typed cell (spreadsheet input) under `column`.
    pub fn set_value(&mut self, column: Column, value: Option<CellValue>) {
        let value = value.filter(|v| !matches!(v, CellValue::Text(text) if text.trim().is_empty()));
        match column {
            Column::Filename => self.filename = value.map(|v| v.render().trim().to_string()),
            Column::Date => self.date = value.map(|v| v.render().trim().to_string()),
            Column::PhoneNumberClient => self.phone_number_client = value,
            Column::PhoneNumberOperator => self.phone_number_operator = value,
            Column::Type => self.call_type = value,
            Column::Status => self.status = value,
            Column::DurationAnswer => self.duration_answer = value,
        }
    }
}

/// All rows parsed from one source file plus the expected columns it carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub columns: BTreeSet<Column>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: BTreeSet<Column>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
