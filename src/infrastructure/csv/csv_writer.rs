// ============================================================
// CSV WRITER
// ============================================================
// Quoted CSV export of a (filtered) row set

use std::borrow::Borrow;

use csv::WriterBuilder;

use crate::domain::csv::Row;
use crate::domain::error::{AppError, Result};

/// Write rows as CSV with standard quoting, columns in header order.
/// Missing keys and empty cells are written as empty fields.
pub fn export_csv<R: Borrow<Row>>(headers: &[String], rows: &[R]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(headers)
        .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

    for (index, row) in rows.iter().enumerate() {
        let row: &Row = row.borrow();
        let record = headers
            .iter()
            .map(|header| row.get(header).map(|value| value.to_string()).unwrap_or_default());

        writer.write_record(record).map_err(|e| {
            AppError::Internal(format!("Failed to write CSV row {}: {}", index + 1, e))
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV output: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::csv::CellValue;

    #[test]
    fn test_export_quotes_embedded_commas() {
        let headers = vec!["x".to_string(), "y".to_string()];
        let row: Row = vec![
            ("x", CellValue::Text("b,c".to_string())),
            ("y", CellValue::Number(2.5)),
        ]
        .into_iter()
        .collect();

        let output = export_csv(&headers, &[&row]).unwrap();
        assert_eq!(output, "x,y\n\"b,c\",2.5\n");
    }

    #[test]
    fn test_export_empty_rows() {
        let headers = vec!["a".to_string()];
        let output = export_csv::<Row>(&headers, &[]).unwrap();
        assert_eq!(output, "a\n");
    }
}
