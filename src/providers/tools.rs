//! Canonical tool contract shared by every provider adapter
//!
//! Tools come in as `CanonicalTool` and calls go out as
//! `CanonicalFunctionCall`. Adapters translate to and from their own wire
//! formats and never alter a tool's name or description.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Function,
}

/// `{type: "function", function: {name, description, parameters}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTool {
    #[serde(rename = "type", default)]
    pub kind: ToolKind,
    pub function: CanonicalFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFunction {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: FunctionParameters,
}

/// JSON-schema style parameter list; both fields default to empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameters {
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl CanonicalTool {
    pub fn function(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ToolKind::Function,
            function: CanonicalFunction {
                name: name.into(),
                description: description.into(),
                parameters: FunctionParameters::default(),
            },
        }
    }

    /// Add a parameter with its JSON schema
    pub fn with_parameter(mut self, name: impl Into<String>, schema: Value, required: bool) -> Self {
        let name = name.into();
        if required {
            self.function.parameters.required.push(name.clone());
        }
        self.function.parameters.properties.insert(name, schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// A tool invocation requested by a model. `arguments` is always JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFunctionCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl CanonicalFunctionCall {
    pub fn parse_arguments(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.arguments)?)
    }
}

/// Normalized result of a tool-enabled completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCompletion {
    /// Plain text the model produced alongside (or instead of) calls
    pub text: Option<String>,
    pub function_calls: Vec<CanonicalFunctionCall>,
}

impl ToolCompletion {
    pub fn has_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }
}

/// Providers return arguments either as JSON text or as a parsed object
pub(crate) fn arguments_to_string(arguments: &Value) -> String {
    match arguments {
        Value::String(text) => text.clone(),
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

/// `{type, properties, required}` object schema used by every wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl ObjectSchema {
    pub(crate) fn from_parameters(parameters: &FunctionParameters, schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            properties: parameters.properties.clone(),
            required: parameters.required.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_tool_defaults_when_fields_missing() {
        let tool: CanonicalTool = serde_json::from_value(json!({
            "type": "function",
            "function": { "name": "ping", "description": "Ping a host" }
        }))
        .unwrap();
        assert!(tool.function.parameters.properties.is_empty());
        assert!(tool.function.parameters.required.is_empty());

        let tool: CanonicalTool = serde_json::from_value(json!({
            "type": "function",
            "function": {
                "name": "ping",
                "description": "Ping a host",
                "parameters": { "properties": { "host": { "type": "string" } } }
            }
        }))
        .unwrap();
        assert_eq!(tool.function.parameters.properties.len(), 1);
        assert!(tool.function.parameters.required.is_empty());
    }

    #[test]
    fn test_builder_and_serialized_shape() {
        let tool = CanonicalTool::function("get_weather", "Look up the weather")
            .with_parameter("city", json!({"type": "string"}), true)
            .with_parameter("unit", json!({"type": "string"}), false);

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "get_weather");
        assert_eq!(value["function"]["parameters"]["required"], json!(["city"]));
        assert_eq!(tool.name(), "get_weather");
    }

    #[test]
    fn test_arguments_to_string() {
        assert_eq!(arguments_to_string(&json!("{\"a\":1}")), "{\"a\":1}");
        assert_eq!(arguments_to_string(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(arguments_to_string(&Value::Null), "{}");
    }

    #[test]
    fn test_parse_arguments() {
        let call = CanonicalFunctionCall {
            id: "call_1".to_string(),
            name: "get_weather".to_string(),
            arguments: "{\"city\":\"Paris\"}".to_string(),
        };
        assert_eq!(call.parse_arguments().unwrap()["city"], "Paris");
    }
}
