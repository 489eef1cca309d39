//! Web search for the research agent, backed by the Serper API.
use async_trait::async_trait;
use serde::Deserialize;

use super::{Tool, ToolError, text_argument, text_parameters};

const SEARCH_ENDPOINT: &str = "https://google.serper.dev/search";
const RESULT_LIMIT: usize = 5;

pub struct SerperSearchTool {
    http: reqwest::Client,
    api_key: String,
}

impl SerperSearchTool {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ToolError> {
        let response = self
            .http
            .post(SEARCH_ENDPOINT)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Api {
                tool: "serper_search".to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<SearchResults>().await?)
    }
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

fn format_results(query: &str, results: &[OrganicResult]) -> String {
    if results.is_empty() {
        return format!("No search results found for '{query}'.");
    }
    let mut output = format!("Search results for '{query}':\n");
    for (index, result) in results.iter().take(RESULT_LIMIT).enumerate() {
        output.push_str(&format!(
            "{}. {}\n   {}\n   {}\n",
            index + 1,
            result.title,
            result.link,
            result.snippet
        ));
    }
    output
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn name(&self) -> &str {
        "serper_search"
    }

    fn description(&self) -> &str {
        "Searches the web and returns the top results with titles, links and snippets. \
         Use it to gather up-to-date information on a topic."
    }

    fn parameters(&self) -> serde_json::Value {
        text_parameters("The search query")
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = text_argument(self.name(), arguments)?;
        let results = self.search(&query).await?;
        Ok(format_results(&query, &results.organic))
    }
}
