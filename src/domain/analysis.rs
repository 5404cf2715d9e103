use serde::{Deserialize, Serialize};

pub const DEFAULT_SUMMARY: &str = "Analysis complete.";
pub const EMPTY_SUMMARY: &str = "No analysis available yet.";
pub const FALLBACK_SUMMARY: &str = "Error generating analysis. Displaying raw data.";
pub const FALLBACK_INSIGHT: &str = "Could not generate automated insights.";
pub const UNTITLED_CHART: &str = "Untitled Chart";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Pie,
        ChartType::Scatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
        }
    }

    /// Unknown labels fall back to `Bar`
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|chart_type| chart_type.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub x_axis_key: String,
    pub data_keys: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnalysis {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub description: String,
}

/// Structured dashboard recommendation returned by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub column_analysis: Vec<ColumnAnalysis>,
    pub key_insights: Vec<String>,
    pub recommended_charts: Vec<ChartConfig>,
}

impl AnalysisResult {
    /// Placeholder held before any dataset has been analyzed
    pub fn empty() -> Self {
        Self {
            summary: EMPTY_SUMMARY.to_string(),
            column_analysis: Vec::new(),
            key_insights: Vec::new(),
            recommended_charts: Vec::new(),
        }
    }

    /// Result used when the model answered with something that is not JSON
    pub fn unparsable_response() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            column_analysis: Vec::new(),
            key_insights: vec![FALLBACK_INSIGHT.to_string()],
            recommended_charts: Vec::new(),
        }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::empty()
    }
}
