use reqwest::blocking::Client;
use serde::Deserialize;

use policydb_core::config::GenerationSettings;
use policydb_core::traits::TextGenerator;
use policydb_core::Result;

use crate::http::{build_client, empty_response, endpoint, send_json};
use crate::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct ChatRespChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResp {
    choices: Vec<ChatRespChoice>,
}

impl OpenAiClient {
    pub fn new(settings: &GenerationSettings, api_key: String) -> Result<Self> {
        let model = if settings.model.trim().is_empty() { DEFAULT_MODEL.to_string() } else { settings.model.clone() };
        Ok(Self {
            client: build_client(crate::timeout(settings))?,
            api_key,
            model,
            url: endpoint(&settings.base_url, DEFAULT_BASE_URL, "chat/completions"),
            temperature: settings.temperature,
            retry: crate::retry_policy(settings),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for OpenAiClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
        });
        let parsed: ChatResp = self.retry.run("openai", || {
            send_json("openai", self.client.post(&self.url).bearer_auth(&self.api_key).json(&body))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| empty_response("openai"))
    }
}
