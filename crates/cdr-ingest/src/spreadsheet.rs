//! Workbook parsing (first sheet only).

use std::collections::BTreeSet;
use std::io::Cursor;

use calamine::{Data, ExcelDateTime, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use cdr_model::{CellValue, Column, Record, RecordSet};

use crate::error::{IngestError, Result};

/// Text layout for date cells, matching what delimited sources carry.
const DATE_CELL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Converts an Excel serial date (1900 date system) to a naive timestamp.
///
/// Fractions are rounded to the nearest second.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

/// Whole seconds of a duration cell.
///
/// Cells with a duration format, and time-only cells with no date part, are
/// lengths of time rather than instants.
fn duration_seconds(value: &ExcelDateTime) -> Option<i64> {
    let serial = value.as_f64();
    let time_only = (0.0..1.0).contains(&serial);
    (serial.is_finite() && (value.is_duration() || time_only))
        .then(|| (serial * SECONDS_PER_DAY).round() as i64)
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Int(value) => Some(CellValue::Int(*value)),
        Data::Float(value) => Some(CellValue::Float(*value)),
        Data::Bool(value) => Some(CellValue::Bool(*value)),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| CellValue::Text(trimmed.to_string()))
        }
        Data::DateTime(value) => match duration_seconds(value) {
            Some(seconds) => Some(CellValue::Int(seconds)),
            None => excel_serial_to_datetime(value.as_f64())
                .map(|dt| CellValue::Text(dt.format(DATE_CELL_FORMAT).to_string())),
        },
        Data::Error(_) | Data::Empty => None,
    }
}

fn header_text(cell: &Data) -> String {
    cell_value(cell).map(|v| v.render()).unwrap_or_default()
}

/// Parses the first sheet of a workbook into a record set.
///
/// The first row of the sheet's used range is the header row.
pub fn parse_spreadsheet(name: &str, bytes: &[u8]) -> Result<RecordSet> {
    let spreadsheet_error = |message: String| IngestError::Spreadsheet {
        name: name.to_string(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| spreadsheet_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoSheet {
            name: name.to_string(),
        })?
        .map_err(|e| spreadsheet_error(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RecordSet::default());
    };
    let mapping: Vec<Option<Column>> = header_row
        .iter()
        .map(|cell| Column::from_header(&header_text(cell)))
        .collect();
    let columns: BTreeSet<Column> = mapping.iter().flatten().copied().collect();

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let mut record = Record::default();
        for (column, cell) in mapping.iter().zip(row.iter()) {
            if let Some(column) = column {
                record.set_value(*column, cell_value(cell));
            }
        }
        records.push(record);
    }

    tracing::debug!(
        file = %name,
        rows = records.len(),
        columns = columns.len(),
        "parsed spreadsheet source"
    );
    Ok(RecordSet::new(columns, records))
}
