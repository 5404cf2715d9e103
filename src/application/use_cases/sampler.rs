use std::borrow::Borrow;

use crate::domain::csv::Row;

/// Compact textual projection of a table for the analysis service.
///
/// Header line plus the first `limit` rows, every value rendered as text and
/// joined with commas. Nothing is re-quoted, so a value holding a comma does not
/// survive a round trip through this text.
pub fn sample<R: Borrow<Row>>(headers: &[String], rows: &[R], limit: usize) -> String {
    let mut lines = Vec::with_capacity(rows.len().min(limit) + 1);
    lines.push(headers.join(","));

    lines.extend(rows.iter().take(limit).map(|row| {
        let row: &Row = row.borrow();
        headers
            .iter()
            .map(|header| row.get(header).map(ToString::to_string).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    }));

    lines.join("\n")
}
