use std::fmt::Display;

use chrono::Local;
use dashmap::DashMap;
use serde::Serialize;

/// Per-task conversation histories, keyed by the task text.
#[derive(Default, Serialize)]
pub struct AgentShortMemory(pub DashMap<String, AgentConversation>);

impl AgentShortMemory {
    pub fn new() -> Self {
        Self(DashMap::new())
    }

    pub fn add(
        &self,
        task: impl Into<String>,
        agent_name: impl Into<String>,
        role: Role,
        message: impl Into<String>,
    ) {
        let mut conversation = self
            .0
            .entry(task.into())
            .or_insert_with(|| AgentConversation::new(agent_name.into()));
        conversation.add(role, message.into());
    }
}

#[derive(Debug, Serialize)]
pub struct AgentConversation {
    agent_name: String,
    pub history: Vec<Message>,
}

impl AgentConversation {
    pub fn new(agent_name: String) -> Self {
        Self {
            agent_name,
            history: Vec::new(),
        }
    }

    pub fn add(&mut self, role: Role, message: String) {
        self.history.push(Message {
            role,
            content: message,
            timestamp: Local::now().timestamp(),
        });
    }
}

impl Display for AgentConversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for message in &self.history {
            writeln!(f, "{}: {}", message.role, message.content)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub enum Role {
    User(String),
    Assistant(String),
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User(name) => write!(f, "{name}(User)"),
            Role::Assistant(name) => write!(f, "{name}(Assistant)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_messages_per_task() {
        let memory = AgentShortMemory::new();
        memory.add("task A", "Agent", Role::User("User".to_owned()), "hello");
        memory.add(
            "task A",
            "Agent",
            Role::Assistant("Agent".to_owned()),
            "hi there",
        );
        memory.add("task B", "Agent", Role::User("User".to_owned()), "other");

        let conversation = memory.0.get("task A").unwrap();
        assert_eq!(conversation.history.len(), 2);
        assert_eq!(conversation.history[1].content, "hi there");
        assert_eq!(memory.0.get("task B").unwrap().history.len(), 1);
    }

    #[test]
    fn displays_role_and_content() {
        let mut conversation = AgentConversation::new("Agent".to_owned());
        conversation.add(Role::User("User".to_owned()), "question".to_owned());
        conversation.add(Role::Assistant("Agent".to_owned()), "answer".to_owned());

        let rendered = conversation.to_string();
        assert!(rendered.contains("User(User): question"));
        assert!(rendered.contains("Agent(Assistant): answer"));
    }
}
