//! Ordered task execution over a registry of agents. Tasks run strictly one
//! after another; each task's prompt carries the completed outputs of every
//! predecessor.
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use twox_hash::XxHash3_64;
use uuid::Uuid;

use crate::agent::{Agent, AgentError};
use crate::conversation::{AgentShortMemory, Role};
use crate::llm::TokenUsage;
use crate::persistence::{self, PersistenceError};
use crate::task::{Task, TaskOutput};

#[derive(Debug, Error)]
pub enum SequentialWorkflowError {
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
    #[error("Tasks or Agents are empty")]
    EmptyTasksOrAgents,
    #[error("Task '{task}' is bound to unknown agent '{agent}'")]
    UnknownAgent { task: String, agent: String },
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Default)]
pub struct SequentialWorkflowBuilder {
    name: String,
    description: String,
    metadata_output_dir: Option<PathBuf>,
    agents: Vec<Box<dyn Agent>>,
    tasks: Vec<Task>,
}

impl SequentialWorkflowBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Directory where run results are persisted as JSON. Without it, nothing
    /// is written to disk.
    pub fn metadata_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_output_dir = Some(dir.into());
        self
    }

    pub fn add_agent(mut self, agent: Box<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(self, agents: Vec<Box<dyn Agent>>) -> Self {
        agents
            .into_iter()
            .fold(self, |builder, agent| builder.add_agent(agent))
    }

    pub fn add_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(self, tasks: Vec<Task>) -> Self {
        tasks
            .into_iter()
            .fold(self, |builder, task| builder.add_task(task))
    }

    pub fn build(self) -> SequentialWorkflow {
        SequentialWorkflow {
            name: self.name,
            description: self.description,
            metadata_output_dir: self.metadata_output_dir,
            agents: self.agents,
            tasks: self.tasks,
            conversation: AgentShortMemory::new(),
        }
    }
}

pub struct SequentialWorkflow {
    name: String,
    description: String,
    metadata_output_dir: Option<PathBuf>,
    agents: Vec<Box<dyn Agent>>,
    tasks: Vec<Task>,
    conversation: AgentShortMemory,
}

impl SequentialWorkflow {
    pub fn builder() -> SequentialWorkflowBuilder {
        SequentialWorkflowBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute every task in declaration order. Agent bindings are validated
    /// before the first task starts.
    pub async fn run(
        &self,
        inputs: HashMap<String, String>,
    ) -> Result<WorkflowResult, SequentialWorkflowError> {
        if self.tasks.is_empty() || self.agents.is_empty() {
            return Err(SequentialWorkflowError::EmptyTasksOrAgents);
        }
        for task in &self.tasks {
            if !self.agents.iter().any(|agent| agent.name() == task.agent()) {
                return Err(SequentialWorkflowError::UnknownAgent {
                    task: task.name().to_owned(),
                    agent: task.agent().to_owned(),
                });
            }
        }

        let run_label = inputs
            .get("topic")
            .cloned()
            .unwrap_or_else(|| self.name.clone());
        self.conversation.add(
            &run_label,
            &self.name,
            Role::User("User".to_owned()),
            format!("inputs: {inputs:?}"),
        );

        let mut task_outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        let mut usage: Option<TokenUsage> = None;

        for task in &self.tasks {
            let agent = self
                .agents
                .iter()
                .find(|agent| agent.name() == task.agent())
                .ok_or_else(|| SequentialWorkflowError::UnknownAgent {
                    task: task.name().to_owned(),
                    agent: task.agent().to_owned(),
                })?;

            tracing::info!(task = %task.name(), agent = %task.agent(), "running task");
            let prompt = task.prompt(&inputs, &task_outputs);
            let output = agent.run(prompt).await?;
            TokenUsage::accumulate(&mut usage, output.usage);

            self.conversation.add(
                &run_label,
                &self.name,
                Role::Assistant(agent.name()),
                &output.response,
            );
            tracing::info!(
                "| sequential workflow | Agent: {} | Task: {} | completed",
                agent.name(),
                task.name()
            );

            task_outputs.push(TaskOutput {
                task: task.name().to_owned(),
                agent: agent.name(),
                output: output.response,
            });
        }

        let raw = task_outputs
            .iter()
            .map(|output| output.output.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let result = WorkflowResult {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            description: self.description.clone(),
            timestamp: Local::now(),
            raw,
            task_outputs,
            token_usage: usage,
        };

        if let Some(dir) = &self.metadata_output_dir {
            self.save_metadata(&run_label, &result, dir).await?;
        }

        Ok(result)
    }

    async fn save_metadata(
        &self,
        run_label: &str,
        result: &WorkflowResult,
        dir: &Path,
    ) -> Result<(), SequentialWorkflowError> {
        let mut hasher = XxHash3_64::default();
        run_label.hash(&mut hasher);
        let run_hash = hasher.finish();
        // Lower 32 bits of the hash keep file names short.
        let path = dir
            .join(format!("{:x}", run_hash & 0xFFFFFFFF))
            .with_extension("json");
        let data = serde_json::to_string_pretty(result)?;
        persistence::save_to_file(data, &path).await?;
        Ok(())
    }
}

/// Aggregate result of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub timestamp: DateTime<Local>,
    /// All task outputs joined in execution order.
    pub raw: String,
    pub task_outputs: Vec<TaskOutput>,
    pub token_usage: Option<TokenUsage>,
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::agent::AgentOutput;

    /// Test double that returns a canned reply and records its prompts.
    struct ScriptedAgent {
        name: String,
        reply: String,
        usage: Option<TokenUsage>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedAgent {
        fn new(
            name: &str,
            reply: &str,
            usage: Option<TokenUsage>,
            prompts: Arc<Mutex<Vec<String>>>,
        ) -> Box<dyn Agent> {
            Box::new(Self {
                name: name.to_owned(),
                reply: reply.to_owned(),
                usage,
                prompts,
            })
        }
    }

    impl Agent for ScriptedAgent {
        fn run(
            &self,
            task: String,
        ) -> Pin<Box<dyn Future<Output = Result<AgentOutput, AgentError>> + Send + '_>> {
            Box::pin(async move {
                self.prompts
                    .lock()
                    .unwrap()
                    .push(format!("{}: {}", self.name, task));
                Ok(AgentOutput {
                    response: self.reply.clone(),
                    usage: self.usage,
                })
            })
        }

        fn id(&self) -> String {
            self.name.clone()
        }

        fn name(&self) -> String {
            self.name.clone()
        }

        fn description(&self) -> String {
            String::new()
        }
    }

    fn usage(total: u64) -> Option<TokenUsage> {
        Some(TokenUsage {
            prompt_tokens: total / 2,
            completion_tokens: total - total / 2,
            total_tokens: total,
        })
    }

    fn topic_inputs() -> HashMap<String, String> {
        HashMap::from([("topic".to_owned(), "agentic platforms".to_owned())])
    }

    #[tokio::test]
    async fn runs_tasks_in_declaration_order_with_predecessor_context() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let workflow = SequentialWorkflow::builder()
            .name("pipeline")
            .add_agent(ScriptedAgent::new(
                "Researcher",
                "alpha findings",
                usage(100),
                prompts.clone(),
            ))
            .add_agent(ScriptedAgent::new(
                "Writer",
                "beta article",
                usage(50),
                prompts.clone(),
            ))
            .add_task(Task::new(
                "Research Task",
                "Research {topic}.",
                "A report.",
                "Researcher",
            ))
            .add_task(Task::new(
                "Writer Task",
                "Write about {topic}.",
                "A post.",
                "Writer",
            ))
            .build();

        let result = workflow.run(topic_inputs()).await.unwrap();

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with("Researcher: Research agentic platforms."));
        // The second task's input incorporates the first task's completed output.
        assert!(prompts[1].starts_with("Writer:"));
        assert!(prompts[1].contains("alpha findings"));
        assert!(prompts[1].contains("[Research Task by Researcher]"));

        assert_eq!(result.task_outputs.len(), 2);
        assert_eq!(result.task_outputs[0].output, "alpha findings");
        assert_eq!(result.task_outputs[1].output, "beta article");
        assert!(result.raw.contains("alpha findings"));
        assert!(result.raw.contains("beta article"));
    }

    #[tokio::test]
    async fn accumulates_token_usage_across_tasks() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let workflow = SequentialWorkflow::builder()
            .name("pipeline")
            .add_agent(ScriptedAgent::new("A", "one", usage(100), prompts.clone()))
            .add_agent(ScriptedAgent::new("B", "two", None, prompts.clone()))
            .add_agent(ScriptedAgent::new("C", "three", usage(30), prompts.clone()))
            .add_task(Task::new("t1", "d1", "e1", "A"))
            .add_task(Task::new("t2", "d2", "e2", "B"))
            .add_task(Task::new("t3", "d3", "e3", "C"))
            .build();

        let result = workflow.run(HashMap::new()).await.unwrap();
        assert_eq!(result.token_usage.unwrap().total_tokens, 130);
    }

    #[tokio::test]
    async fn usage_stays_absent_when_no_agent_reports_it() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let workflow = SequentialWorkflow::builder()
            .name("pipeline")
            .add_agent(ScriptedAgent::new("A", "one", None, prompts.clone()))
            .add_task(Task::new("t1", "d1", "e1", "A"))
            .build();

        let result = workflow.run(HashMap::new()).await.unwrap();
        assert!(result.token_usage.is_none());
    }

    #[tokio::test]
    async fn rejects_empty_workflows() {
        let workflow = SequentialWorkflow::builder().name("empty").build();
        assert!(matches!(
            workflow.run(HashMap::new()).await,
            Err(SequentialWorkflowError::EmptyTasksOrAgents)
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_agent_bindings_before_executing_anything() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let workflow = SequentialWorkflow::builder()
            .name("pipeline")
            .add_agent(ScriptedAgent::new("A", "one", None, prompts.clone()))
            .add_task(Task::new("t1", "d1", "e1", "A"))
            .add_task(Task::new("t2", "d2", "e2", "Missing"))
            .build();

        let error = workflow.run(HashMap::new()).await.unwrap_err();
        assert!(matches!(
            error,
            SequentialWorkflowError::UnknownAgent { agent, .. } if agent == "Missing"
        ));
        // Validation happens up front: no task ran.
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn persists_run_metadata_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let workflow = SequentialWorkflow::builder()
            .name("pipeline")
            .metadata_output_dir(dir.path())
            .add_agent(ScriptedAgent::new("A", "one", usage(10), prompts.clone()))
            .add_task(Task::new("t1", "d1 {topic}", "e1", "A"))
            .build();

        let result = workflow.run(topic_inputs()).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let data = std::fs::read(&entries[0]).unwrap();
        let persisted: WorkflowResult = serde_json::from_slice(&data).unwrap();
        assert_eq!(persisted.id, result.id);
        assert_eq!(persisted.task_outputs[0].output, "one");
    }
}
