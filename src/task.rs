use std::collections::HashMap;

use serde::Serialize;

/// A unit of work bound to one agent, executed in a fixed sequence. The
/// description and expected output are templates with `{placeholder}` fields.
/// Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    name: String,
    description: String,
    expected_output: String,
    agent: String,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the agent this task is bound to.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn render(&self, inputs: &HashMap<String, String>) -> (String, String) {
        (
            substitute(&self.description, inputs),
            substitute(&self.expected_output, inputs),
        )
    }

    /// The full prompt for this task: rendered description, expected output
    /// and the completed outputs of every predecessor task.
    pub fn prompt(&self, inputs: &HashMap<String, String>, context: &[TaskOutput]) -> String {
        let (description, expected_output) = self.render(inputs);
        let mut prompt = description;
        prompt.push_str(&format!("\n\nThis is the expected output: {expected_output}"));
        if !context.is_empty() {
            prompt.push_str("\n\nUse the following completed task outputs as context:");
            for output in context {
                prompt.push_str(&format!(
                    "\n\n[{} by {}]\n{}",
                    output.task, output.agent, output.output
                ));
            }
        }
        prompt
    }
}

fn substitute(template: &str, inputs: &HashMap<String, String>) -> String {
    inputs.iter().fold(template.to_owned(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

/// The recorded result of one completed task.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct TaskOutput {
    pub task: String,
    pub agent: String,
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(topic: &str) -> HashMap<String, String> {
        HashMap::from([("topic".to_owned(), topic.to_owned())])
    }

    #[test]
    fn renders_placeholders_in_description_and_expected_output() {
        let task = Task::new(
            "Research Task",
            "Analyze the major {topic}.",
            "A detailed report on {topic}.",
            "Senior Research Analyst",
        );
        let (description, expected) = task.render(&inputs("AI trends"));
        assert_eq!(description, "Analyze the major AI trends.");
        assert_eq!(expected, "A detailed report on AI trends.");
    }

    #[test]
    fn prompt_without_context_has_no_context_section() {
        let task = Task::new("t", "Do {topic}.", "Done.", "Agent");
        let prompt = task.prompt(&inputs("it"), &[]);
        assert!(prompt.starts_with("Do it."));
        assert!(prompt.contains("This is the expected output: Done."));
        assert!(!prompt.contains("context"));
    }

    #[test]
    fn prompt_incorporates_predecessor_outputs() {
        let task = Task::new("Writer Task", "Write about {topic}.", "A post.", "Writer");
        let context = vec![TaskOutput {
            task: "Research Task".to_owned(),
            agent: "Researcher".to_owned(),
            output: "key findings here".to_owned(),
        }];
        let prompt = task.prompt(&inputs("AI"), &context);
        assert!(prompt.contains("[Research Task by Researcher]"));
        assert!(prompt.contains("key findings here"));
    }

    #[test]
    fn unknown_placeholders_are_left_untouched() {
        let task = Task::new("t", "Do {other}.", "Done.", "Agent");
        let (description, _) = task.render(&inputs("it"));
        assert_eq!(description, "Do {other}.");
    }
}
