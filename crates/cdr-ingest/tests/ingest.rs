//! Integration tests for source parsing across formats.

use std::io::{Cursor, Write};

use cdr_ingest::{IngestError, parse_source};
use cdr_model::{CellValue, Column, canonical_phone};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Calls" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn text_cell(reference: &str, value: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{value}</t></is></c>"#)
}

fn number_cell(reference: &str, value: &str) -> String {
    format!(r#"<c r="{reference}"><v>{value}</v></c>"#)
}

fn sheet_xml(rows: &[Vec<String>]) -> String {
    let mut body = String::new();
    for (idx, cells) in rows.iter().enumerate() {
        body.push_str(&format!(r#"<row r="{}">"#, idx + 1));
        for cell in cells {
            body.push_str(cell);
        }
        body.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{body}</sheetData></worksheet>"#
    )
}

fn build_xlsx(rows: &[Vec<String>]) -> Vec<u8> {
    let sheet = sheet_xml(rows);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, body) in parts {
        writer.start_file(path, options.clone()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn semicolon_csv_parses_with_detected_separator() {
    let source = "filename;date;phone_number_client;phone_number_operator;type;status;duration_answer\n\
                  a.wav;2023-01-01 10:00:00;555;101;in;answered;12\n";
    let set = parse_source("calls.csv", source.as_bytes()).unwrap();

    assert_eq!(set.columns.len(), 7);
    assert_eq!(set.records.len(), 1);
    assert_eq!(set.records[0].filename.as_deref(), Some("a.wav"));
    assert_eq!(set.records[0].duration_answer, Some(CellValue::Int(12)));
}

#[test]
fn spreadsheet_first_sheet_parses_with_expected_columns() {
    let bytes = build_xlsx(&[
        vec![
            text_cell("A1", "filename"),
            text_cell("B1", "date"),
            text_cell("C1", "phone_number_client"),
            text_cell("D1", "status"),
        ],
        vec![
            text_cell("A2", "a.wav"),
            text_cell("B2", "2023-01-01 10:00:00"),
            number_cell("C2", "555"),
            text_cell("D2", "answered"),
        ],
    ]);

    let set = parse_source("calls.xlsx", &bytes).unwrap();

    assert!(set.has_column(Column::Filename));
    assert!(set.has_column(Column::PhoneNumberClient));
    assert!(!set.has_column(Column::Type));
    assert_eq!(set.records.len(), 1);
    let record = &set.records[0];
    assert_eq!(record.filename.as_deref(), Some("a.wav"));
    assert_eq!(record.date.as_deref(), Some("2023-01-01 10:00:00"));
    assert_eq!(canonical_phone(record.phone_number_client.as_ref()), "555");
    assert_eq!(
        record.status,
        Some(CellValue::Text("answered".to_string()))
    );
}

#[test]
fn csv_and_spreadsheet_agree_on_canonical_phone() {
    let csv = parse_source(
        "calls.csv",
        b"filename,date,phone_number_client\na.wav,2023-01-01,555.0\n",
    )
    .unwrap();
    let xlsx = parse_source(
        "calls.xlsx",
        &build_xlsx(&[
            vec![
                text_cell("A1", "filename"),
                text_cell("B1", "date"),
                text_cell("C1", "phone_number_client"),
            ],
            vec![
                text_cell("A2", "a.wav"),
                text_cell("B2", "2023-01-01"),
                number_cell("C2", "555"),
            ],
        ]),
    )
    .unwrap();

    assert_eq!(
        canonical_phone(csv.records[0].phone_number_client.as_ref()),
        canonical_phone(xlsx.records[0].phone_number_client.as_ref())
    );
}

#[test]
fn unsupported_extension_is_reported() {
    let result = parse_source("calls.ods", b"");
    assert!(matches!(result, Err(IngestError::UnsupportedFormat { .. })));
}
