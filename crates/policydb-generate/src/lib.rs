//! policydb-generate
//!
//! Text-generation collaborators behind [`TextGenerator`]. The provider is
//! picked from settings; a missing credential is reported when generation is
//! attempted, so retrieval-only commands keep working without one.
mod http;

pub mod anthropic;
pub mod openai;
pub mod retry;

use std::time::Duration;
use tracing::debug;

use policydb_core::config::{GenerationSettings, ProviderKind};
use policydb_core::traits::TextGenerator;
use policydb_core::{Error, Result};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use retry::RetryPolicy;

pub enum Collaborator {
    /// No provider configured.
    Disabled,
    /// A provider was selected but cannot be used.
    Unavailable { provider: ProviderKind, reason: String },
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
}

impl Collaborator {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let provider = settings.provider;
        if provider == ProviderKind::None {
            return Ok(Self::Disabled);
        }
        let Some(api_key) = settings.resolved_api_key() else {
            let var = if provider == ProviderKind::OpenAi { "OPENAI_API_KEY" } else { "ANTHROPIC_API_KEY" };
            debug!(provider = provider.as_str(), "no API key configured");
            return Ok(Self::Unavailable {
                provider,
                reason: format!("{} is not configured; set generation.api_key or {var}", provider.as_str()),
            });
        };
        Ok(match provider {
            ProviderKind::OpenAi => Self::OpenAi(OpenAiClient::new(settings, api_key)?),
            ProviderKind::Anthropic => Self::Anthropic(AnthropicClient::new(settings, api_key)?),
            ProviderKind::None => Self::Disabled,
        })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::OpenAi(_) | Self::Anthropic(_))
    }
}

impl TextGenerator for Collaborator {
    fn provider(&self) -> &str {
        match self {
            Self::Disabled => "none",
            Self::Unavailable { provider, .. } => provider.as_str(),
            Self::OpenAi(c) => c.provider(),
            Self::Anthropic(c) => c.provider(),
        }
    }

    fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        match self {
            Self::Disabled => Err(Error::Configuration("text generation is disabled; set generation.provider".into())),
            Self::Unavailable { reason, .. } => Err(Error::Configuration(reason.clone())),
            Self::OpenAi(c) => c.generate(prompt, system),
            Self::Anthropic(c) => c.generate(prompt, system),
        }
    }
}

pub(crate) fn timeout(settings: &GenerationSettings) -> Duration {
    Duration::from_secs(settings.timeout_secs.max(1))
}

pub(crate) fn retry_policy(settings: &GenerationSettings) -> RetryPolicy {
    RetryPolicy::new(settings.max_retries, Duration::from_millis(settings.retry_backoff_ms))
}
