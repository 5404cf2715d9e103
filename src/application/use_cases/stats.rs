use std::borrow::Borrow;

use serde::Serialize;

use crate::domain::csv::Row;

/// KPI figures for a (possibly filtered) row set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_field_count: usize,
}

/// Row count of the whole set; column and numeric counts from the first row only.
pub fn compute_stats<R: Borrow<Row>>(rows: &[R]) -> DataStats {
    let Some(first) = rows.first().map(|row| -> &Row { row.borrow() }) else {
        return DataStats::default();
    };

    DataStats {
        row_count: rows.len(),
        column_count: first.len(),
        numeric_field_count: first.values().filter(|value| value.is_numeric()).count(),
    }
}
