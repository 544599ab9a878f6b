// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI-compatible chat-completions client

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AiConfig, RankingBackend};

/// One request, no retry, bounded by a client-level timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 800;

pub struct ChatClient {
    client: Client,
    config: AiConfig,
}

impl ChatClient {
    pub fn new(config: AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl RankingBackend for ChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let payload = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .context("Ranking service request failed")?
            .error_for_status()
            .context("Ranking service returned an error status")?;

        let completion: ChatResponse = response
            .json()
            .await
            .context("Failed to decode ranking service response")?;

        match completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
        {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => bail!("Ranking service returned no content"),
        }
    }
}
