//! Wikipedia lookup backed by the MediaWiki search API.
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use super::{Tool, ToolError, text_argument, text_parameters};

// Search snippets come back with <span class="searchmatch"> markup.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

const RESULT_LIMIT: usize = 3;

pub struct WikipediaTool {
    http: reqwest::Client,
    language: String,
}

impl WikipediaTool {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_language(http, "en")
    }

    pub fn with_language(http: reqwest::Client, language: impl Into<String>) -> Self {
        Self {
            http,
            language: language.into(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolError> {
        let url = format!("https://{}.wikipedia.org/w/api.php", self.language);
        let limit = RESULT_LIMIT.to_string();
        let response = self
            .http
            .get(url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srlimit", limit.as_str()),
                ("srsearch", query),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Api {
                tool: "wikipedia".to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<SearchResponse>().await?;
        Ok(body.query.search)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No Wikipedia articles found for '{query}'.");
    }
    let mut output = format!("Wikipedia results for '{query}':\n");
    for (index, hit) in hits.iter().take(RESULT_LIMIT).enumerate() {
        let snippet = TAG_PATTERN.replace_all(&hit.snippet, "");
        output.push_str(&format!("{}. {}: {}\n", index + 1, hit.title, snippet));
    }
    output
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Searches Wikipedia and returns the top matching article titles with a short snippet. \
         Use it for factual and encyclopedic questions."
    }

    fn parameters(&self) -> serde_json::Value {
        text_parameters("Search query for Wikipedia articles")
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = text_argument(self.name(), arguments)?;
        let hits = self.search(&query).await?;
        Ok(format_hits(&query, &hits))
    }
}
