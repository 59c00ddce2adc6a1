use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::config::SearchConfig;
use crate::services::SearchBackend;

pub const NO_RESULTS: &str = "No real-time results found.";
pub const SEARCH_APOLOGY: &str = "I'm sorry, I couldn't fetch live data.";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    snippet: Option<String>,
}

/// Google results through SerpAPI.
#[derive(Clone)]
pub struct SerpApiSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SerpApiSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
        }
    }

    /// `Ok(None)` when the engine answered but had no organic results.
    pub async fn top_snippet(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("hl", "en"),
                ("gl", "us"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search Server Error: {}", response.status()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(first_snippet(body))
    }
}

fn first_snippet(body: SearchResponse) -> Option<String> {
    body.organic_results
        .into_iter()
        .next()
        .and_then(|r| r.snippet)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pure function: raw SerpAPI JSON -> spoken answer.
pub fn snippet_from_json(json: &str) -> String {
    match serde_json::from_str::<SearchResponse>(json) {
        Ok(body) => first_snippet(body).unwrap_or_else(|| NO_RESULTS.to_string()),
        Err(_) => SEARCH_APOLOGY.to_string(),
    }
}

#[async_trait]
impl SearchBackend for SerpApiSearch {
    async fn search(&self, query: &str) -> String {
        match self.top_snippet(query).await {
            Ok(Some(snippet)) => snippet,
            Ok(None) => NO_RESULTS.to_string(),
            Err(e) => {
                warn!("Search backend failed: {}", e);
                SEARCH_APOLOGY.to_string()
            }
        }
    }
}
