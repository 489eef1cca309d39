use async_trait::async_trait;
use thiserror::Error;

use crate::llm::ToolDefinition;

pub mod math;
pub mod search;
pub mod wikipedia;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments for tool {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{tool} request failed with status {status}")]
    Api { tool: String, status: u16 },
}

/// A named callable the model can invoke. Arguments arrive as the JSON payload
/// produced by the model; the return value is always a string.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema describing the tool's arguments.
    fn parameters(&self) -> serde_json::Value;

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters())
    }
}

/// Schema for tools that take a single free-text argument.
pub(crate) fn text_parameters(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "text": { "type": "string", "description": description }
        },
        "required": ["text"]
    })
}

/// Extract the free-text argument. Models occasionally send a bare string
/// instead of the declared object, so both forms are accepted.
pub(crate) fn text_argument(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<String, ToolError> {
    match arguments {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Object(map) => map
            .get("text")
            .and_then(|value| value.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ToolError::InvalidArguments {
                tool: tool.to_owned(),
                message: "expected a 'text' string field".to_owned(),
            }),
        other => Err(ToolError::InvalidArguments {
            tool: tool.to_owned(),
            message: format!("expected an object with a 'text' field, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_argument_accepts_object_and_bare_string() {
        let from_object =
            text_argument("add_numbers", serde_json::json!({"text": "1 and 2"})).unwrap();
        assert_eq!(from_object, "1 and 2");

        let from_string = text_argument("add_numbers", serde_json::json!("3 and 4")).unwrap();
        assert_eq!(from_string, "3 and 4");
    }

    #[test]
    fn text_argument_rejects_other_shapes() {
        let error = text_argument("add_numbers", serde_json::json!(42)).unwrap_err();
        assert!(matches!(error, ToolError::InvalidArguments { tool, .. } if tool == "add_numbers"));

        let error = text_argument("add_numbers", serde_json::json!({"query": "x"})).unwrap_err();
        assert!(matches!(error, ToolError::InvalidArguments { .. }));
    }
}
