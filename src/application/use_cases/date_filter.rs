use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::domain::csv::{CellValue, Row};
use crate::domain::time_window::TimeWindow;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Rows whose date column falls inside `window`, anchored at the start of `today`.
///
/// An unset date column or an empty input returns every row. Otherwise rows with
/// a missing, empty, zero or unparsable date are excluded, whatever the window.
pub fn filter_by_date<'a>(
    rows: &'a [Row],
    date_column: Option<&str>,
    window: TimeWindow,
    today: NaiveDate,
) -> Vec<&'a Row> {
    let column = match date_column.map(str::trim) {
        Some(column) if !column.is_empty() && !rows.is_empty() => column,
        _ => return rows.iter().collect(),
    };

    let lower_bound = window.lower_bound(today);

    rows.iter()
        .filter(|row| {
            let Some(date) = row.get(column).and_then(parse_cell_date) else {
                return false;
            };
            lower_bound.map_or(true, |bound| date >= bound)
        })
        .collect()
}

/// Local wall-clock instant of a cell, if it holds a recognizable date.
/// Numbers are epoch milliseconds.
pub fn parse_cell_date(value: &CellValue) -> Option<NaiveDateTime> {
    if !value.is_present() {
        return None;
    }

    match value {
        CellValue::Number(millis) => {
            if !millis.is_finite() {
                return None;
            }
            Local
                .timestamp_millis_opt(millis.trunc() as i64)
                .single()
                .map(|instant| instant.naive_local())
        }
        CellValue::Text(text) => parse_date_text(text),
        CellValue::Empty => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    let with_offset = DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| {
            OFFSET_DATETIME_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(text, format).ok())
        })
        .or_else(|| DateTime::parse_from_rfc2822(text).ok());
    if let Some(instant) = with_offset {
        return Some(instant.with_timezone(&Local).naive_local());
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(datetime);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        // Year and month only
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn dated_row(date: &str) -> Row {
        vec![
            ("Date", CellValue::from_field(date)),
            ("Revenue", CellValue::Number(1.0)),
        ]
        .into_iter()
        .collect()
    }

    fn days_ago(days: u64) -> String {
        today()
            .checked_sub_days(Days::new(days))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn dates(rows: &[&Row]) -> Vec<String> {
        rows.iter()
            .map(|row| row.get("Date").map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_unset_column_is_identity() {
        let rows = vec![dated_row("garbage"), dated_row("")];

        for column in [None, Some(""), Some("  ")] {
            let filtered = filter_by_date(&rows, column, TimeWindow::Day, today());
            assert_eq!(filtered.len(), rows.len());
            for (kept, original) in filtered.iter().zip(&rows) {
                assert!(std::ptr::eq(*kept, original));
            }
        }
    }

    #[test]
    fn test_empty_rows() {
        let rows: Vec<Row> = Vec::new();
        assert!(filter_by_date(&rows, Some("Date"), TimeWindow::Week, today()).is_empty());
    }

    #[test]
    fn test_week_window() {
        let rows = vec![dated_row(&days_ago(10)), dated_row(&days_ago(2))];
        let filtered = filter_by_date(&rows, Some("Date"), TimeWindow::Week, today());

        assert_eq!(dates(&filtered), vec![days_ago(2)]);
    }

    #[test]
    fn test_week_boundary_is_inclusive() {
        let rows = vec![dated_row(&days_ago(7)), dated_row(&days_ago(8))];
        let filtered = filter_by_date(&rows, Some("Date"), TimeWindow::Week, today());

        assert_eq!(dates(&filtered), vec![days_ago(7)]);
    }

    #[test]
    fn test_day_window() {
        let rows = vec![
            dated_row("2024-06-15"),
            dated_row("2024-06-15 13:45:00"),
            dated_row("2024-06-14 23:59:59"),
        ];
        let filtered = filter_by_date(&rows, Some("Date"), TimeWindow::Day, today());

        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_month_and_year_windows() {
        let rows = vec![
            dated_row("2024-05-15"),
            dated_row("2024-05-14"),
            dated_row("2023-06-15"),
            dated_row("2023-06-14"),
        ];

        let month = filter_by_date(&rows, Some("Date"), TimeWindow::Month, today());
        assert_eq!(dates(&month), vec!["2024-05-15"]);

        let year = filter_by_date(&rows, Some("Date"), TimeWindow::Year, today());
        assert_eq!(dates(&year), vec!["2024-05-15", "2024-05-14", "2023-06-15"]);
    }

    #[test]
    fn test_unparsable_and_missing_dates_excluded() {
        let mut missing = Row::new();
        missing.insert("Revenue", CellValue::Number(3.0));
        let rows = vec![
            dated_row("not a date"),
            dated_row(""),
            dated_row("0"),
            missing,
            dated_row("2024-06-10"),
        ];

        let filtered = filter_by_date(&rows, Some("Date"), TimeWindow::All, today());
        assert_eq!(dates(&filtered), vec!["2024-06-10"]);
    }

    #[test]
    fn test_unknown_window_includes_every_dated_row() {
        let rows = vec![dated_row("1999-01-01"), dated_row("2024-06-14")];
        let window = TimeWindow::from_label("Decade");

        let filtered = filter_by_date(&rows, Some("Date"), window, today());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_parse_date_forms() {
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };

        let text = |s: &str| CellValue::Text(s.to_string());
        assert_eq!(parse_cell_date(&text("2023-01-05")), Some(midnight(2023, 1, 5)));
        assert_eq!(parse_cell_date(&text("2023/01/05")), Some(midnight(2023, 1, 5)));
        assert_eq!(parse_cell_date(&text("01/05/2023")), Some(midnight(2023, 1, 5)));
        assert_eq!(parse_cell_date(&text("January 5, 2023")), Some(midnight(2023, 1, 5)));
        assert_eq!(parse_cell_date(&text("2023-01")), Some(midnight(2023, 1, 1)));
        assert_eq!(
            parse_cell_date(&text("2023-01-05T08:30:00")),
            midnight(2023, 1, 5).checked_add_signed(chrono::Duration::minutes(510))
        );
        assert!(parse_cell_date(&text("2023-01-05T08:30:00Z")).is_some());
        assert!(parse_cell_date(&text("Thu, 05 Jan 2023 08:30:00 +0000")).is_some());
        assert_eq!(parse_cell_date(&text("2023-13-45")), None);
        assert_eq!(parse_cell_date(&CellValue::Empty), None);
    }

    #[test]
    fn test_numbers_are_epoch_millis() {
        let expected = Local
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .map(|instant| instant.naive_local());
        assert_eq!(
            parse_cell_date(&CellValue::Number(1_700_000_000_000.0)),
            expected
        );
        assert_eq!(parse_cell_date(&CellValue::Number(0.0)), None);
        assert_eq!(parse_cell_date(&CellValue::Number(f64::INFINITY)), None);
    }
}
