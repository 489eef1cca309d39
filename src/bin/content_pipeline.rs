//! Research -> write -> socialize pipeline: three agents run a fixed task
//! sequence for one topic, then the token budget guard decides whether the
//! process may keep going.
use std::collections::HashMap;
use std::io::Write as _;

use anyhow::Result;
use minicrew::budget::TokenBudget;
use minicrew::config::{self, BackendPreferences};
use minicrew::pipeline;
use minicrew::sequential_workflow::SequentialWorkflow;

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
    let serper_api_key = config::require_env("SERPER_API_KEY")?;
    let http = reqwest::Client::builder().build()?;

    print!("Enter topic for AI Research: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let topic = match line.trim() {
        "" => pipeline::DEFAULT_TOPIC,
        topic => topic,
    };

    let workflow = SequentialWorkflow::builder()
        .name("research-pipeline")
        .description("Research a topic, write a blog post about it and derive social posts.")
        .metadata_output_dir("./metadata")
        .agents(pipeline::research_agents(client, http, serper_api_key))
        .tasks(pipeline::research_tasks())
        .build();

    println!("\nRunning workflow for topic: {topic}\n");
    let inputs = HashMap::from([("topic".to_owned(), topic.to_owned())]);
    let budget = TokenBudget::new(pipeline::TOKEN_LIMIT, pipeline::COOLDOWN);

    match workflow.run(inputs).await {
        Ok(result) => {
            println!("\nWorkflow completed!\n");
            println!("Final combined output:\n{}", truncate(&result.raw, 1500));

            println!("\nTask-wise outputs:");
            for (index, output) in result.task_outputs.iter().enumerate() {
                println!(
                    "\n--- Task {} ({}, {}) ---",
                    index + 1,
                    output.task,
                    output.agent
                );
                println!("{}...", truncate(&output.output, 600));
            }

            if let Some(usage) = &result.token_usage {
                println!("\nToken usage summary:");
                println!(
                    "Total: {} | Prompt: {} | Completion: {}",
                    usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
                );
            }

            budget.enforce(result.token_usage.as_ref()).await;
        }
        Err(e) => {
            eprintln!("\nERROR: {e}");
            eprintln!("Tip: you might be hitting provider rate limits. Wait a few seconds and retry.");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
