use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::conversation::{AgentConversation, AgentShortMemory, Role};
use crate::llm::{ChatClient, ChatMessage, ChatRequest, TokenUsage, ToolDefinition};
use crate::tool::Tool;

use super::{Agent, AgentConfig, AgentError, AgentOutput};

/// Returned as the response when every loop iteration ended in tool calls and
/// the model never produced a final answer.
pub const LOOP_LIMIT_MESSAGE: &str = "Stopped: tool-call loop limit reached without a final answer.";

pub struct CrewAgentBuilder {
    client: ChatClient,
    config: AgentConfig,
    tools: Vec<Arc<dyn Tool>>,
}

impl CrewAgentBuilder {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            config: AgentConfig::default(),
            tools: Vec::new(),
        }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.config.role = role.into();
        self
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.config.goal = Some(goal.into());
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.config.backstory = Some(backstory.into());
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.config.allow_delegation = allow;
        self
    }

    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.config.user_name = name.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn max_loops(mut self, max_loops: u32) -> Self {
        self.config.max_loops = max_loops;
        self
    }

    pub fn retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.config.retry_attempts = retry_attempts;
        self
    }

    pub fn add_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn tools(self, tools: Vec<Arc<dyn Tool>>) -> Self {
        tools
            .into_iter()
            .fold(self, |mut builder, tool| {
                builder.tools.push(tool);
                builder
            })
    }

    pub fn build(self) -> CrewAgent {
        CrewAgent {
            client: self.client,
            config: self.config,
            tools: self.tools,
            short_memory: AgentShortMemory::new(),
        }
    }
}

/// A role-bound, tool-calling agent over one chat backend.
pub struct CrewAgent {
    client: ChatClient,
    config: AgentConfig,
    tools: Vec<Arc<dyn Tool>>,
    short_memory: AgentShortMemory,
}

impl CrewAgent {
    pub fn builder(client: ChatClient) -> CrewAgentBuilder {
        CrewAgentBuilder::new(client)
    }

    fn system_prompt(&self) -> String {
        let mut prompt = format!("You are {}.", self.config.role);
        if let Some(backstory) = &self.config.backstory {
            prompt.push_str(&format!(" {backstory}"));
        }
        if let Some(goal) = &self.config.goal {
            prompt.push_str(&format!("\nYour personal goal is: {goal}"));
        }
        if !self.config.allow_delegation {
            prompt.push_str("\nComplete the task yourself without delegating it.");
        }
        if !self.tools.is_empty() {
            prompt.push_str(
                "\nUse the provided tools when they fit the task, and answer with the final result.",
            );
        }
        prompt
    }

    fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// One completion call with per-attempt retries.
    async fn complete_with_retries(
        &self,
        task: &str,
        request: &ChatRequest,
    ) -> Result<crate::llm::ChatResponse, AgentError> {
        for attempt in 0..self.config.retry_attempts {
            match self.client.chat(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::error!("Attempt {}, task: {}, failed: {}", attempt + 1, task, e);
                }
            }
        }
        Err(AgentError::RetriesExhausted(self.config.retry_attempts))
    }

    async fn execute_tool_call(&self, name: &str, arguments: &str) -> String {
        let arguments = match serde_json::from_str::<serde_json::Value>(arguments) {
            Ok(arguments) => arguments,
            Err(e) => return format!("Error: invalid tool arguments: {e}"),
        };
        match self.find_tool(name) {
            Some(tool) => match tool.call(arguments).await {
                Ok(output) => output,
                Err(e) => format!("Error: {e}"),
            },
            None => format!("Error: unknown tool '{name}'"),
        }
    }
}

impl Agent for CrewAgent {
    fn run(
        &self,
        task: String,
    ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, AgentError>> + Send + '_>> {
        Box::pin(async move {
            self.short_memory.add(
                &task,
                &self.config.role,
                Role::User(self.config.user_name.clone()),
                &task,
            );

            let mut messages = vec![ChatMessage::system(self.system_prompt())];
            messages.extend(
                self.short_memory
                    .0
                    .get(&task)
                    .map(|conversation| history_messages(&conversation))
                    .unwrap_or_default(),
            );

            let tools: Vec<ToolDefinition> =
                self.tools.iter().map(|tool| tool.definition()).collect();
            let mut usage: Option<TokenUsage> = None;
            let mut response_text = String::new();
            let mut answered = false;

            for _loop_count in 0..self.config.max_loops {
                let request = ChatRequest {
                    model: String::new(),
                    messages: messages.clone(),
                    tools: tools.clone(),
                    temperature: Some(self.config.temperature),
                    max_tokens: Some(self.config.max_tokens),
                };

                let response = self.complete_with_retries(&task, &request).await?;
                TokenUsage::accumulate(&mut usage, response.usage);

                let message = response
                    .choices
                    .into_iter()
                    .next()
                    .ok_or(AgentError::NoChoiceFound)?
                    .message;

                if message.tool_calls.is_empty() {
                    response_text = message.content.unwrap_or_default();
                    answered = true;
                    self.short_memory.add(
                        &task,
                        &self.config.role,
                        Role::Assistant(self.config.role.clone()),
                        &response_text,
                    );
                    break;
                }

                let calls = message.tool_calls.clone();
                messages.push(message);
                for call in calls {
                    let output = self
                        .execute_tool_call(&call.function.name, &call.function.arguments)
                        .await;
                    tracing::debug!(tool = %call.function.name, output = %output, "tool call completed");
                    messages.push(ChatMessage::tool(call.id, output));
                }
            }

            if !answered {
                tracing::warn!(
                    task = %task,
                    max_loops = self.config.max_loops,
                    "loop limit reached without a final assistant message"
                );
                response_text = LOOP_LIMIT_MESSAGE.to_owned();
                self.short_memory.add(
                    &task,
                    &self.config.role,
                    Role::Assistant(self.config.role.clone()),
                    &response_text,
                );
            }

            Ok(AgentOutput {
                response: response_text,
                usage,
            })
        })
    }

    fn id(&self) -> String {
        self.config.id.clone()
    }

    fn name(&self) -> String {
        self.config.role.clone()
    }

    fn description(&self) -> String {
        self.config.goal.clone().unwrap_or_default()
    }
}

fn history_messages(conversation: &AgentConversation) -> Vec<ChatMessage> {
    conversation
        .history
        .iter()
        .map(|message| match &message.role {
            Role::User(name) => ChatMessage::user(format!("{}: {}", name, message.content)),
            Role::Assistant(name) => {
                ChatMessage::assistant(format!("{}: {}", name, message.content))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use crate::tool::math::{AddNumbers, PowerNumbers};

    fn test_client() -> ChatClient {
        ChatClient::new(Provider::OpenAi, "sk-test", "gpt-4o-mini").unwrap()
    }

    #[test]
    fn system_prompt_reflects_role_goal_and_backstory() {
        let agent = CrewAgentBuilder::new(test_client())
            .role("Senior Research Analyst")
            .goal("Uncover cutting-edge insights")
            .backstory("You are an expert researcher.")
            .build();

        let prompt = agent.system_prompt();
        assert!(prompt.starts_with("You are Senior Research Analyst."));
        assert!(prompt.contains("You are an expert researcher."));
        assert!(prompt.contains("Your personal goal is: Uncover cutting-edge insights"));
        assert!(prompt.contains("without delegating"));
    }

    #[test]
    fn system_prompt_omits_delegation_clause_when_allowed() {
        let agent = CrewAgentBuilder::new(test_client())
            .role("Tech Content Strategist")
            .allow_delegation(true)
            .build();
        assert!(!agent.system_prompt().contains("without delegating"));
    }

    #[test]
    fn tools_are_looked_up_by_name() {
        let agent = CrewAgentBuilder::new(test_client())
            .add_tool(AddNumbers)
            .add_tool(PowerNumbers)
            .build();
        assert!(agent.find_tool("power_numbers").is_some());
        assert!(agent.find_tool("divide_numbers").is_none());
    }

    #[tokio::test]
    async fn tool_call_execution_converts_faults_to_error_strings() {
        let agent = CrewAgentBuilder::new(test_client())
            .add_tool(AddNumbers)
            .build();

        let output = agent
            .execute_tool_call("add_numbers", "{\"text\":\"Add 12, 8 and 5\"}")
            .await;
        assert_eq!(output, "25");

        let output = agent.execute_tool_call("add_numbers", "not json").await;
        assert!(output.starts_with("Error:"));

        let output = agent.execute_tool_call("missing_tool", "{}").await;
        assert!(output.starts_with("Error: unknown tool"));
    }

    #[tokio::test]
    async fn exhausted_loop_budget_yields_stop_message_and_is_recorded() {
        // With a zero loop budget the run ends before any completion call, the
        // same state as a model issuing tool calls on every iteration.
        let agent = CrewAgentBuilder::new(test_client())
            .role("Assistant")
            .max_loops(0)
            .build();

        let output = agent.run("count something".to_owned()).await.unwrap();
        assert_eq!(output.response, LOOP_LIMIT_MESSAGE);

        let conversation = agent.short_memory.0.get("count something").unwrap();
        let last = conversation.history.last().unwrap();
        assert_eq!(last.content, LOOP_LIMIT_MESSAGE);
        assert!(matches!(last.role, Role::Assistant(_)));
    }
}
