use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Coarse relative range used to filter rows by their date column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum TimeWindow {
    Day,
    Week,
    #[default]
    Month,
    Year,
    /// Any unrecognized label; no lower bound
    All,
}

impl TimeWindow {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "day" => TimeWindow::Day,
            "week" => TimeWindow::Week,
            "month" => TimeWindow::Month,
            "year" => TimeWindow::Year,
            _ => TimeWindow::All,
        }
    }

    /// Earliest instant a row may carry to fall inside the window, anchored at
    /// the start of `today`. `None` means unbounded.
    pub fn lower_bound(&self, today: NaiveDate) -> Option<NaiveDateTime> {
        let start = match self {
            TimeWindow::Day => Some(today),
            TimeWindow::Week => today.checked_sub_days(Days::new(7)),
            TimeWindow::Month => today.checked_sub_months(Months::new(1)),
            TimeWindow::Year => today.checked_sub_months(Months::new(12)),
            TimeWindow::All => None,
        }?;
        start.and_hms_opt(0, 0, 0)
    }
}

impl From<String> for TimeWindow {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}
