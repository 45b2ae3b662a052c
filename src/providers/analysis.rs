//! Structured code analysis on top of a plain completion

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// System prompt that pins the model to the `CodeAnalysis` JSON shape
pub const CODE_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a senior code reviewer. Analyze the code you are given and respond with a single JSON object in exactly this shape:
{
  "summary": "One paragraph describing what the code does",
  "complexity": "low | medium | high",
  "qualityIssues": [{"severity": "low | medium | high", "description": "...", "line": 12}],
  "securityIssues": [{"severity": "low | medium | high", "description": "...", "line": 40}],
  "suggestions": ["..."],
  "dependencies": ["..."]
}
Use empty arrays when there is nothing to report. "line" may be omitted. No extra text outside the JSON."#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeAnalysis {
    pub summary: String,
    pub complexity: String,
    pub quality_issues: Vec<CodeIssue>,
    pub security_issues: Vec<CodeIssue>,
    pub suggestions: Vec<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeIssue {
    pub severity: String,
    pub description: String,
    /// Advisory; anything that is not a non-negative integer reads as `None`
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_line")]
    pub line: Option<u32>,
}

/// Accepts `12` or `"12"`; negative, fractional or non-numeric values become `None`
fn lenient_line<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// User prompt sent alongside `CODE_ANALYSIS_SYSTEM_PROMPT`
pub fn analysis_prompt(code: &str, language: &str) -> String {
    format!(
        "Analyze the following {} code:\n\n```{}\n{}\n```",
        language, language, code
    )
}

/// Parse a model response, falling back to the first top-level `{...}` block
pub fn parse_code_analysis(raw: &str) -> Result<CodeAnalysis> {
    if let Ok(analysis) = serde_json::from_str::<CodeAnalysis>(raw.trim()) {
        return Ok(analysis);
    }

    let block = extract_json_object(raw).ok_or_else(|| {
        EngineError::LlmApi("code analysis response contained no JSON object".to_string())
    })?;

    serde_json::from_str(block)
        .map_err(|e| EngineError::LlmApi(format!("code analysis response was not valid JSON: {e}")))
}

/// First balanced top-level `{...}` block, ignoring braces inside strings
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct_json() {
        let raw = r#"{"summary":"adds numbers","complexity":"low","suggestions":["add tests"]}"#;
        let analysis = parse_code_analysis(raw).unwrap();
        assert_eq!(analysis.summary, "adds numbers");
        assert_eq!(analysis.suggestions, vec!["add tests".to_string()]);
        assert!(analysis.security_issues.is_empty());
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = "Here is the analysis:\n```json\n{\"summary\":\"uses {braces} in text\",\"complexity\":\"medium\",\
\"qualityIssues\":[{\"severity\":\"low\",\"description\":\"magic number\",\"line\":3}]}\n```\nHope this helps!";
        let analysis = parse_code_analysis(raw).unwrap();
        assert_eq!(analysis.summary, "uses {braces} in text");
        assert_eq!(analysis.quality_issues[0].line, Some(3));
    }

    #[test]
    fn test_parse_failure_is_llm_api_error() {
        assert!(matches!(parse_code_analysis("no json here"), Err(EngineError::LlmApi(_))));
        assert!(matches!(parse_code_analysis("broken {\"summary\": }"), Err(EngineError::LlmApi(_))));
    }

    #[test]
    fn test_unusual_line_values_do_not_fail_the_analysis() {
        let raw = r#"{"summary":"ok","qualityIssues":[
            {"severity":"low","description":"a","line":"12"},
            {"severity":"low","description":"b","line":-1},
            {"severity":"low","description":"c","line":null},
            {"severity":"low","description":"d","line":"near the top"},
            {"severity":"low","description":"e"},
            {"severity":"low","description":"f","line":7}
        ]}"#;
        let analysis = parse_code_analysis(raw).unwrap();
        let lines: Vec<Option<u32>> = analysis.quality_issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![Some(12), None, None, None, None, Some(7)]);
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("a {\"b\": {\"c\": 1}} d {}"), Some("{\"b\": {\"c\": 1}}"));
        assert_eq!(extract_json_object("{\"s\": \"\\\"}\"}"), Some("{\"s\": \"\\\"}\"}"));
        assert_eq!(extract_json_object("{ unterminated"), None);
        assert_eq!(extract_json_object("none"), None);
    }

    #[test]
    fn test_analysis_prompt() {
        let prompt = analysis_prompt("print(1)", "python");
        assert_eq!(prompt, "Analyze the following python code:\n\n```python\nprint(1)\n```");
    }
}
