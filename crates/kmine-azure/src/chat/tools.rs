//! Function-calling types for the chat completion wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function the model may choose to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The function definition.
    pub function: FunctionDefinition,
}

impl FunctionTool {
    /// Creates a function tool from its name, description and JSON schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Name, description and parameter schema of a callable function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name as the model must emit it.
    pub name: String,
    /// Human-readable description used by the model to pick a function.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Controls whether the model must call a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides.
    Auto,
    /// The model must call one of the supplied functions.
    Required,
    /// The model must not call any function.
    None,
}

/// A function call emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier of this call.
    #[serde(default)]
    pub id: String,
    /// Always `"function"`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// The called function.
    pub function: FunctionCall,
}

/// Function name and raw JSON arguments of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the called function.
    pub name: String,
    /// Arguments as a JSON-encoded string.
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    /// Parses the JSON-encoded arguments.
    pub fn parse_arguments(&self) -> serde_json::Result<Value> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn function_tool_wire_shape() {
        let tool = FunctionTool::new("Greeting", "Say hi", json!({"type": "object"}));
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "Greeting");
    }

    #[test]
    fn tool_choice_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ToolChoice::Required).unwrap(), json!("required"));
    }

    #[test]
    fn empty_arguments_parse_as_object() {
        let call = FunctionCall {
            name: "Greeting".to_string(),
            arguments: String::new(),
        };
        assert_eq!(call.parse_arguments().unwrap(), json!({}));
    }
}
