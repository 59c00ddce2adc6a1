use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::config::ChatConfig;
use crate::services::ChatBackend;

pub const SYSTEM_PROMPT: &str = "You are Jarvis, a helpful AI assistant.";
pub const CHAT_APOLOGY: &str = "I'm sorry, I couldn't process that request.";

#[derive(Clone)]
pub struct ChatService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ChatService {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs)) // Network-level timeout
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request_body = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            max_tokens: 256,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Chat Server Error: {}", response.status()));
        }

        let resp_json: CompletionResponse = response.json().await?;
        resp_json
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("Chat response had no content"))
    }
}

#[async_trait]
impl ChatBackend for ChatService {
    async fn chat(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Chat backend failed: {}", e);
                CHAT_APOLOGY.to_string()
            }
        }
    }
}
