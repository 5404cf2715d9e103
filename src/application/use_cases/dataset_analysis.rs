use crate::domain::analysis::{
    AnalysisResult, ChartConfig, ChartType, ColumnAnalysis, DEFAULT_SUMMARY, UNTITLED_CHART,
};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::{clean_llm_response, strip_code_fence};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DatasetAnalysisUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
}

impl DatasetAnalysisUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        Self { llm_client }
    }

    /// Ask the model for a dashboard configuration of the sampled dataset
    pub async fn execute(&self, config: &LLMConfig, sample: &str) -> Result<AnalysisResult> {
        let prompt = build_analysis_prompt(sample);
        let schema = analysis_response_schema();

        debug!(sample_len = sample.len(), model = %config.model, "Requesting dataset analysis");

        let raw = self
            .llm_client
            .generate_json(config, &prompt, &schema)
            .await?;

        if raw.trim().is_empty() {
            return Err(AppError::LLMError("Failed to analyze data".to_string()));
        }

        Ok(sanitize_analysis(&raw))
    }
}

pub fn build_analysis_prompt(sample: &str) -> String {
    format!(
        "You are an expert Data Scientist specializing in Data Visualization.\n\
         Analyze the following CSV dataset sample and create a configuration for a dashboard.\n\n\
         Prioritize creating 4 distinct charts that tell a story about the data.\n\
         Do NOT provide long text summaries. Keep insights concise.\n\n\
         For the charts, strictly follow the allowed types: {}.\n\
         Ensure 'dataKeys' is ALWAYS an array of strings representing the numeric columns to plot.\n\
         Ensure 'xAxisKey' is a string representing the category or time column.\n\n\
         Dataset Sample:\n{}",
        ChartType::ALL
            .iter()
            .map(|chart_type| format!("'{}'", chart_type.as_str()))
            .collect::<Vec<_>>()
            .join(", "),
        sample
    )
}

/// Gemini response schema for `AnalysisResult`
pub fn analysis_response_schema() -> Value {
    let chart_types: Vec<&str> = ChartType::ALL.iter().map(ChartType::as_str).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "columnAnalysis": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "type": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    }
                }
            },
            "keyInsights": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "recommendedCharts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": chart_types },
                        "xAxisKey": { "type": "STRING" },
                        "dataKeys": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "description": { "type": "STRING" }
                    }
                }
            }
        }
    })
}

/// Coerce model output into a complete `AnalysisResult`.
/// Text that is not a JSON object yields the fallback analysis.
pub fn sanitize_analysis(raw: &str) -> AnalysisResult {
    let cleaned = clean_llm_response(raw);
    let payload = strip_code_fence(&cleaned);

    let parsed: Value = match serde_json::from_str(&payload) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Failed to parse analysis response");
            return AnalysisResult::unparsable_response();
        }
    };

    let Some(object) = parsed.as_object() else {
        warn!("Analysis response is not a JSON object");
        return AnalysisResult::unparsable_response();
    };

    let summary = match string_field(object, "summary") {
        summary if summary.is_empty() => DEFAULT_SUMMARY.to_string(),
        summary => summary,
    };

    AnalysisResult {
        summary,
        column_analysis: array_field(object, "columnAnalysis")
            .filter_map(Value::as_object)
            .map(|column| ColumnAnalysis {
                name: string_field(column, "name"),
                column_type: string_field(column, "type"),
                description: string_field(column, "description"),
            })
            .collect(),
        key_insights: string_items(object, "keyInsights"),
        recommended_charts: array_field(object, "recommendedCharts")
            .filter_map(Value::as_object)
            .map(sanitize_chart)
            .collect(),
    }
}

fn sanitize_chart(chart: &Map<String, Value>) -> ChartConfig {
    let title = match string_field(chart, "title") {
        title if title.is_empty() => UNTITLED_CHART.to_string(),
        title => title,
    };

    ChartConfig {
        title,
        chart_type: ChartType::from_label(&string_field(chart, "type")),
        x_axis_key: string_field(chart, "xAxisKey"),
        data_keys: string_items(chart, "dataKeys"),
        description: string_field(chart, "description"),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn array_field<'a>(object: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    object
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn string_items(object: &Map<String, Value>, key: &str) -> Vec<String> {
    array_field(object, key)
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{FALLBACK_INSIGHT, FALLBACK_SUMMARY};
    use crate::domain::chat::ChatTurn;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeClient {
        response: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn answering(response: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                response,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMClient for FakeClient {
        async fn generate_json(
            &self,
            _config: &LLMConfig,
            prompt: &str,
            _schema: &Value,
        ) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response.clone()
        }

        async fn chat(
            &self,
            _config: &LLMConfig,
            _system: &str,
            _history: &[ChatTurn],
            _message: &str,
        ) -> Result<String> {
            unreachable!()
        }

        async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_execute_sends_sample_and_sanitizes() {
        let client = FakeClient::answering(Ok(
            r#"{"summary":"Revenue grows","keyInsights":["Dec peak"],"recommendedCharts":[{"title":"Revenue","type":"line","xAxisKey":"Month","dataKeys":["Revenue"]}]}"#
                .to_string(),
        ));
        let use_case = DatasetAnalysisUseCase::new(client.clone());

        let result = use_case
            .execute(&LLMConfig::default(), "Date,Revenue\n2023-01-01,100")
            .await
            .unwrap();

        assert_eq!(result.summary, "Revenue grows");
        assert_eq!(result.key_insights, vec!["Dec peak"]);
        assert_eq!(result.recommended_charts[0].chart_type, ChartType::Line);
        assert_eq!(result.recommended_charts[0].description, "");

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Dataset Sample:\nDate,Revenue\n2023-01-01,100"));
    }

    #[tokio::test]
    async fn test_execute_empty_response_is_error() {
        let use_case = DatasetAnalysisUseCase::new(FakeClient::answering(Ok("  ".to_string())));
        let err = use_case
            .execute(&LLMConfig::default(), "a\n1")
            .await
            .unwrap_err();

        assert_eq!(err, AppError::LLMError("Failed to analyze data".to_string()));
    }

    #[tokio::test]
    async fn test_execute_propagates_client_error() {
        let use_case = DatasetAnalysisUseCase::new(FakeClient::answering(Err(
            AppError::LLMError("API error (500): boom".to_string()),
        )));

        assert!(matches!(
            use_case.execute(&LLMConfig::default(), "a\n1").await,
            Err(AppError::LLMError(_))
        ));
    }

    #[test]
    fn test_sanitize_unparsable_text() {
        let result = sanitize_analysis("Here is my analysis: revenue went up.");

        assert_eq!(result.summary, FALLBACK_SUMMARY);
        assert_eq!(result.key_insights, vec![FALLBACK_INSIGHT]);
        assert!(result.column_analysis.is_empty());
        assert!(result.recommended_charts.is_empty());
    }

    #[test]
    fn test_sanitize_non_object_json() {
        assert_eq!(sanitize_analysis("[1, 2]"), AnalysisResult::unparsable_response());
    }

    #[test]
    fn test_sanitize_fenced_json() {
        let result = sanitize_analysis("```json\n{\"summary\":\"ok\"}\n```");
        assert_eq!(result.summary, "ok");
    }

    #[test]
    fn test_sanitize_defaults() {
        let result = sanitize_analysis(
            r#"{
                "summary": "",
                "columnAnalysis": [{"name": "Revenue"}, 5],
                "keyInsights": "not a list",
                "recommendedCharts": [
                    {"type": "donut", "dataKeys": "Revenue"},
                    {"title": "Users", "type": "AREA", "dataKeys": ["ActiveUsers", 3]}
                ]
            }"#,
        );

        assert_eq!(result.summary, DEFAULT_SUMMARY);
        assert_eq!(
            result.column_analysis,
            vec![ColumnAnalysis {
                name: "Revenue".to_string(),
                column_type: String::new(),
                description: String::new(),
            }]
        );
        assert!(result.key_insights.is_empty());

        let first = &result.recommended_charts[0];
        assert_eq!(first.title, UNTITLED_CHART);
        assert_eq!(first.chart_type, ChartType::Bar);
        assert_eq!(first.x_axis_key, "");
        assert!(first.data_keys.is_empty());

        let second = &result.recommended_charts[1];
        assert_eq!(second.chart_type, ChartType::Area);
        assert_eq!(second.data_keys, vec!["ActiveUsers"]);
    }

    #[test]
    fn test_schema_lists_chart_types() {
        let schema = analysis_response_schema();
        let types = &schema["properties"]["recommendedCharts"]["items"]["properties"]["type"]["enum"];
        assert_eq!(types.as_array().unwrap().len(), 5);
    }
}
