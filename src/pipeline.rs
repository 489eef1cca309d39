//! Static registries for the research -> write -> socialize pipeline. Agents
//! and tasks are constructed once at startup and read-only afterwards.
use std::time::Duration;

use crate::agent::Agent;
use crate::agent::crew_agent::CrewAgentBuilder;
use crate::llm::ChatClient;
use crate::task::Task;
use crate::tool::search::SerperSearchTool;

pub const DEFAULT_TOPIC: &str = "Future of Agentic AI Platforms";

/// Safe buffer under Groq's 12k tokens-per-minute limit.
pub const TOKEN_LIMIT: u64 = 8_000;
pub const COOLDOWN: Duration = Duration::from_secs(15);

pub const RESEARCH_AGENT: &str = "Senior Research Analyst";
pub const WRITER_AGENT: &str = "Tech Content Strategist";
pub const SOCIAL_MEDIA_AGENT: &str = "Social Media Strategist";

pub fn research_agents(
    client: ChatClient,
    http: reqwest::Client,
    serper_api_key: impl Into<String>,
) -> Vec<Box<dyn Agent>> {
    let search_tool = SerperSearchTool::new(http, serper_api_key);

    vec![
        Box::new(
            CrewAgentBuilder::new(client.clone())
                .role(RESEARCH_AGENT)
                .goal(
                    "Uncover cutting-edge information and insights on any subject \
                     with comprehensive analysis",
                )
                .backstory(
                    "You are an expert researcher with extensive experience in gathering, \
                     analyzing, and synthesizing information across multiple domains. You excel \
                     at identifying key trends, finding reliable data sources, and producing \
                     valuable reports.",
                )
                .allow_delegation(false)
                .add_tool(search_tool)
                .build(),
        ),
        Box::new(
            CrewAgentBuilder::new(client.clone())
                .role(WRITER_AGENT)
                .goal("Craft well-structured and engaging content based on research findings")
                .backstory(
                    "You are a skilled content strategist known for translating complex topics \
                     into clear and compelling narratives. You write engaging blog posts for \
                     tech audiences, balancing depth and readability.",
                )
                .allow_delegation(true)
                .build(),
        ),
        Box::new(
            CrewAgentBuilder::new(client)
                .role(SOCIAL_MEDIA_AGENT)
                .goal(
                    "Create engaging short-form content and social posts that highlight the \
                     main insights from research and blog articles.",
                )
                .backstory(
                    "You are an expert in crafting platform-specific social media content for \
                     tech audiences. You can take a long article or research and turn it into \
                     catchy, concise, and thought-provoking posts suitable for platforms like \
                     LinkedIn, X (Twitter), and Threads.",
                )
                .allow_delegation(false)
                .build(),
        ),
    ]
}

pub fn research_tasks() -> Vec<Task> {
    vec![
        Task::new(
            "Research Task",
            "Analyze the major {topic}, identifying key trends and technologies. Provide a \
             detailed report on their potential impact.",
            "A detailed report on {topic}, including trends, emerging technologies, and their \
             impact.",
            RESEARCH_AGENT,
        ),
        Task::new(
            "Writer Task",
            "Create an engaging blog post based on the research findings about {topic}. Tailor \
             the content for a tech-savvy audience.",
            "A 4-paragraph blog post on {topic}, written clearly and engagingly for tech \
             enthusiasts.",
            WRITER_AGENT,
        ),
        Task::new(
            "Social Media Task",
            "Generate a concise summary and short-form posts for LinkedIn and X (Twitter) based \
             on the blog content about {topic}. Ensure tone consistency and engaging hooks.",
            "A short LinkedIn post (100-150 words) and a tweet (max 280 chars) summarizing the \
             {topic} in an engaging and insightful way.",
            SOCIAL_MEDIA_AGENT,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;

    fn test_client() -> ChatClient {
        ChatClient::new(Provider::Groq, "gsk-test", "llama-3.1-8b-instant").unwrap()
    }

    #[test]
    fn every_task_is_bound_to_a_registered_agent() {
        let agents = research_agents(test_client(), reqwest::Client::new(), "serper-test");
        let names: Vec<String> = agents.iter().map(|agent| agent.name()).collect();
        for task in research_tasks() {
            assert!(
                names.iter().any(|name| name == task.agent()),
                "task '{}' bound to unregistered agent '{}'",
                task.name(),
                task.agent()
            );
        }
    }

    #[test]
    fn tasks_are_declared_in_pipeline_order() {
        let tasks = research_tasks();
        let agents: Vec<&str> = tasks.iter().map(|task| task.agent()).collect();
        assert_eq!(agents, vec![RESEARCH_AGENT, WRITER_AGENT, SOCIAL_MEDIA_AGENT]);
    }

    #[test]
    fn budget_constants_match_the_provider_buffer() {
        assert_eq!(TOKEN_LIMIT, 8_000);
        assert_eq!(COOLDOWN, Duration::from_secs(15));
        assert!(!DEFAULT_TOPIC.is_empty());
    }
}
