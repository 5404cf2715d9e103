use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::chat::{ChatSession, ChatUseCase};
use super::dataset_analysis::DatasetAnalysisUseCase;
use super::date_filter::filter_by_date;
use super::sampler;
use super::stats::{compute_stats, DataStats};
use crate::domain::analysis::AnalysisResult;
use crate::domain::chat::ChatMessage;
use crate::domain::csv::{CellValue, Row, Table};
use crate::domain::error::{AppError, Result};
use crate::domain::settings::AppSettings;
use crate::domain::time_window::TimeWindow;
use crate::infrastructure::csv::{export_csv, parse_csv};

pub const PREVIEW_ROWS: usize = 5;
pub const PREVIEW_COLUMNS: usize = 6;
pub const TABLE_ROWS: usize = 100;

/// Leading rows and columns of a row set, keyed by the first row
#[derive(Debug, Serialize)]
pub struct TablePreview<'a> {
    pub headers: Vec<&'a str>,
    pub rows: Vec<Vec<&'a CellValue>>,
}

impl<'a> TablePreview<'a> {
    pub fn new(rows: &[&'a Row], max_rows: usize, max_columns: usize) -> Self {
        let headers = rows
            .first()
            .map(|row| row.keys().take(max_columns).collect())
            .unwrap_or_default();

        let rows = rows
            .iter()
            .take(max_rows)
            .map(|row| row.values().take(max_columns).collect())
            .collect();

        Self { headers, rows }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView<'a> {
    pub file_name: Option<&'a str>,
    pub window: TimeWindow,
    pub date_column: Option<&'a str>,
    pub columns: &'a [String],
    pub stats: DataStats,
    pub analysis: &'a AnalysisResult,
    pub overview: TablePreview<'a>,
    pub table: TablePreview<'a>,
    /// Filtered rows for chart rendering
    pub rows: Vec<&'a Row>,
    pub messages: &'a [ChatMessage],
}

/// The loaded dataset with its sample, analysis and chat state
#[derive(Debug, Clone, Default)]
pub struct DashboardSession {
    file_name: Option<String>,
    table: Table,
    sample: String,
    analysis: AnalysisResult,
    chat: ChatSession,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.file_name.is_some()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.chat.transcript()
    }

    /// Parse, sample and analyze `content`. State is replaced only once the
    /// analysis succeeds.
    pub async fn load(
        &mut self,
        analysis: &DatasetAnalysisUseCase,
        settings: &AppSettings,
        file_name: &str,
        content: &str,
    ) -> Result<&AnalysisResult> {
        let table = parse_csv(content);
        let sample = sampler::sample(&table.headers, &table.rows, settings.sample_limit);

        info!(
            file = file_name,
            rows = table.row_count(),
            columns = table.column_count(),
            sample_len = sample.len(),
            "Dataset parsed"
        );

        let result = analysis.execute(&settings.llm, &sample).await?;

        *self = Self {
            file_name: Some(file_name.to_string()),
            table,
            sample,
            analysis: result,
            chat: ChatSession::new(),
        };

        Ok(&self.analysis)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn filtered_rows(
        &self,
        settings: &AppSettings,
        window: TimeWindow,
        today: NaiveDate,
    ) -> Vec<&Row> {
        filter_by_date(&self.table.rows, settings.date_column(), window, today)
    }

    pub fn view<'a>(
        &'a self,
        settings: &'a AppSettings,
        window: TimeWindow,
        today: NaiveDate,
    ) -> DashboardView<'a> {
        let rows = self.filtered_rows(settings, window, today);

        DashboardView {
            file_name: self.file_name(),
            window,
            date_column: settings.date_column(),
            columns: &self.table.headers,
            stats: compute_stats(&rows),
            analysis: &self.analysis,
            overview: TablePreview::new(&rows, PREVIEW_ROWS, PREVIEW_COLUMNS),
            table: TablePreview::new(&rows, TABLE_ROWS, usize::MAX),
            rows,
            messages: self.chat.transcript(),
        }
    }

    /// Filtered rows as CSV, with the download file name
    pub fn export(
        &self,
        settings: &AppSettings,
        window: TimeWindow,
        today: NaiveDate,
    ) -> Result<(String, String)> {
        let file_name = self.file_name.as_deref().ok_or_else(no_dataset)?;
        let rows = self.filtered_rows(settings, window, today);
        let content = export_csv(&self.table.headers, &rows)?;

        Ok((export_file_name(file_name), content))
    }

    pub async fn ask(
        &mut self,
        chat: &ChatUseCase,
        settings: &AppSettings,
        question: &str,
    ) -> Result<ChatMessage> {
        if !self.is_loaded() {
            return Err(no_dataset());
        }
        chat.ask(&settings.llm, &self.sample, &mut self.chat, question)
            .await
    }
}

fn no_dataset() -> AppError {
    AppError::NotFound("No dataset loaded".to_string())
}

fn export_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("data");
    format!("{}_filtered.csv", stem)
}
