//! Interactive math and knowledge assistant: free-text queries are dispatched
//! by the agent to calculator tools and a Wikipedia lookup.
use std::io::Write as _;

use anyhow::Result;
use minicrew::agent::Agent;
use minicrew::agent::crew_agent::CrewAgentBuilder;
use minicrew::config::BackendPreferences;
use minicrew::tool::math::{AddNumbers, DivideNumbers, MultiplyNumbers, PowerNumbers, SubtractNumbers};
use minicrew::tool::wikipedia::WikipediaTool;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_line_number(true)
        .with_file(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = BackendPreferences::from_env().connect()?;
    let http = reqwest::Client::builder().build()?;

    let agent = CrewAgentBuilder::new(client)
        .role("Math & Knowledge Assistant")
        .goal(
            "Answer arithmetic questions with the calculator tools and look up \
             facts on Wikipedia",
        )
        .allow_delegation(false)
        .add_tool(AddNumbers)
        .add_tool(SubtractNumbers)
        .add_tool(MultiplyNumbers)
        .add_tool(DivideNumbers)
        .add_tool(PowerNumbers)
        .add_tool(WikipediaTool::new(http))
        .build();

    println!("Agent is live! Type 'exit' to quit.");
    let stdin = std::io::stdin();
    loop {
        print!("\nEnter your question: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "quit" | "q") {
            println!("Exiting.");
            break;
        }

        match agent.run(query.to_owned()).await {
            Ok(output) => println!("\nResult: {}", output.response),
            Err(e) => tracing::error!("agent failed: {e}"),
        }
    }

    Ok(())
}
