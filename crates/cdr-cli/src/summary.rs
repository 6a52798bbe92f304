//! Table rendering for command results.

use chrono::DateTime;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cdr_core::{CacheStats, RunOutput, RunReport};
use cdr_model::{CellValue, Operator};

/// Renders the call list with a recording marker per row.
pub fn calls_table(output: &RunOutput) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Date (UTC)"),
        header_cell("Type"),
        header_cell("Status"),
        header_cell("Answered (s)"),
        header_cell("Client"),
        header_cell("Operator"),
        header_cell("Recording"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 7, CellAlignment::Center);
    for call in &output.calls {
        let has_recording = output
            .index
            .get(&call.id)
            .is_some_and(|entry| entry.url.is_some());
        table.add_row(vec![
            Cell::new(call.id.as_str()),
            Cell::new(format_epoch(call.date)),
            value_cell(call.call_type.as_ref()),
            value_cell(call.status.as_ref()),
            value_cell(call.duration_answer.as_ref()),
            Cell::new(&call.phone_number_client),
            Cell::new(&call.phone_number_operator),
            if has_recording {
                Cell::new("yes").fg(Color::Green)
            } else {
                dim_cell("-")
            },
        ]);
    }
    table
}

pub fn print_report(report: &RunReport) {
    println!(
        "Files: {} listed, {} parsed, {} from cache, {} evicted, {} skipped",
        report.listed,
        report.parsed,
        report.reused,
        report.evicted.len(),
        report.skipped.len()
    );
    println!("Calls: {} ({} recordings available)", report.rows, report.audio);
    if report.skipped.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Skipped file"), header_cell("Reason")]);
    apply_table_style(&mut table);
    for skipped in &report.skipped {
        table.add_row(vec![
            Cell::new(&skipped.name).fg(Color::Yellow),
            Cell::new(&skipped.error.detail),
        ]);
    }
    println!("{table}");
}

pub fn operators_table(operators: &[Operator]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Phone"), header_cell("Name")]);
    apply_table_style(&mut table);
    for operator in operators {
        table.add_row(vec![
            Cell::new(&operator.phone_number),
            Cell::new(&operator.name),
        ]);
    }
    table
}

pub fn cache_table(stats: &CacheStats, filenames: &[String]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Cached file")]);
    apply_table_style(&mut table);
    for name in filenames {
        table.add_row(vec![Cell::new(name)]);
    }
    table.add_row(vec![
        Cell::new(format!("{} entries", stats.entries))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn format_epoch(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

fn value_cell(value: Option<&CellValue>) -> Cell {
    match value {
        Some(value) => Cell::new(value.render()),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
