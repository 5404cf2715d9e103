// ============================================================
// CSV PARSER
// ============================================================
// Comma-separated text with double-quote quoting, held fully in memory

use crate::domain::csv::{CellValue, Row, Table};
use tracing::debug;

/// Parse CSV text into a typed table.
///
/// Blank lines are discarded anywhere in the input. The first remaining line is
/// the header. Data lines split on commas outside quoted segments, and a line
/// whose field count differs from the header count is dropped. Never fails.
pub fn parse_csv(content: &str) -> Table {
    let mut lines = split_lines(content).filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Table::default();
    };

    let headers: Vec<String> = header_line
        .split(',')
        .map(|header| strip_quotes(header.trim()).to_string())
        .collect();

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for line in lines {
        let fields = split_fields(line);
        if fields.len() != headers.len() {
            dropped += 1;
            continue;
        }

        let row: Row = headers
            .iter()
            .zip(fields)
            .map(|(header, raw)| {
                let value = CellValue::from_field(strip_quotes(raw.trim()));
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        dropped,
        "Parsed CSV content"
    );

    Table::new(headers, rows)
}

/// Physical lines split on `\r\n` or `\n`
fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Split on commas preceded by an even number of quote characters
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut quotes = 0usize;
    let mut start = 0;

    for (idx, c) in line.char_indices() {
        match c {
            '"' => quotes += 1,
            ',' if quotes % 2 == 0 => {
                fields.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);

    fields
}

/// Remove one leading and one trailing quote; a lone quote strips to empty
fn strip_quotes(value: &str) -> &str {
    if value == "\"" {
        ""
    } else if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
