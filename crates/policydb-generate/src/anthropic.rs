use reqwest::blocking::Client;
use serde::Deserialize;

use policydb_core::config::GenerationSettings;
use policydb_core::traits::TextGenerator;
use policydb_core::Result;

use crate::http::{build_client, empty_response, endpoint, send_json};
use crate::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Messages API client.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResp {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

impl AnthropicClient {
    pub fn new(settings: &GenerationSettings, api_key: String) -> Result<Self> {
        let model = if settings.model.trim().is_empty() { DEFAULT_MODEL.to_string() } else { settings.model.clone() };
        Ok(Self {
            client: build_client(crate::timeout(settings))?,
            api_key,
            model,
            url: endpoint(&settings.base_url, DEFAULT_BASE_URL, "messages"),
            max_tokens: settings.max_tokens,
            retry: crate::retry_policy(settings),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for AnthropicClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let parsed: MessagesResp = self.retry.run("anthropic", || {
            send_json(
                "anthropic",
                self.client
                    .post(&self.url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", API_VERSION)
                    .json(&body),
            )
        })?;
        parsed.content.into_iter().next().map(|b| b.text).ok_or_else(|| empty_response("anthropic"))
    }
}
