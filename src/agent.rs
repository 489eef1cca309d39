use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use thiserror::Error;

use crate::llm::{LlmError, TokenUsage};
use crate::tool::ToolError;

pub mod crew_agent;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
    #[error("No completion choice found")]
    NoChoiceFound,
    #[error("All {0} retry attempts failed")]
    RetriesExhausted(u32),
}

/// What one agent run produced: the final response text plus the token usage
/// summed over every completion call the run made, when the backend reports it.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    pub response: String,
    pub usage: Option<TokenUsage>,
}

pub trait Agent: Send + Sync {
    /// Run the agent on a single task to completion.
    fn run(
        &self,
        task: String,
    ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, AgentError>> + Send + '_>>;

    fn id(&self) -> String;

    fn name(&self) -> String;

    fn description(&self) -> String;
}

/// Agent configuration. Immutable after the agent is built.
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub id: String,
    pub role: String,
    pub goal: Option<String>,
    pub backstory: Option<String>,
    pub allow_delegation: bool,
    pub user_name: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub max_loops: u32,
    pub retry_attempts: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: "Assistant".to_owned(),
            goal: None,
            backstory: None,
            allow_delegation: false,
            user_name: "User".to_owned(),
            temperature: 0.5,
            max_tokens: 1200,
            max_loops: 5,
            retry_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.role, "Assistant");
        assert!(!config.allow_delegation);
        assert_eq!(config.max_loops, 5);
        assert_eq!(config.retry_attempts, 3);
        assert!(!config.id.is_empty());
    }
}
