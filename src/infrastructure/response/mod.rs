use once_cell::sync::Lazy;
use regex::Regex;

/// Blocks some models emit around or before their answer
static HIDDEN_BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap(),
        Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap(),
        Regex::new(r"<internal>[\s\S]*?</internal>").unwrap(),
    ]
});

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static CODE_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(?:json|JSON)?\s*([\s\S]*?)\s*```$").unwrap());

/// Remove hidden reasoning blocks and collapse long blank runs
pub fn clean_llm_response(response: &str) -> String {
    let mut cleaned = response.to_string();

    for pattern in HIDDEN_BLOCK_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    MULTIPLE_NEWLINES_PATTERN
        .replace_all(cleaned.trim(), "\n\n")
        .into_owned()
}

/// Unwrap a payload the model wrapped in a markdown code fence
pub fn strip_code_fence(output: &str) -> String {
    let trimmed = output.trim();

    if let Some(captures) = CODE_FENCE_PATTERN.captures(trimmed) {
        return captures
            .get(1)
            .map(|body| body.as_str().to_string())
            .unwrap_or_default();
    }

    // Opening fence without a closing one
    if let Some(stripped) = trimmed.strip_prefix("```json") {
        return stripped.trim().to_string();
    }
    if let Some(stripped) = trimmed.strip_prefix("```") {
        return stripped.trim().to_string();
    }

    trimmed.to_string()
}
