//! Layered configuration and path helpers.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml` and
//! `APP_*` environment variables (`__` separates nested keys, so
//! `APP_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`).
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::BackendKind;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load from the current working directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load with `config*.toml` looked up in `base_dir`; relative paths in the
    /// settings resolve against it too.
    pub fn load_from(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir: base_dir.to_path_buf() })
    }

    /// Build directly from an in-memory figment (tests, embedding callers).
    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self { figment, base_dir: base_dir.to_path_buf() }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed settings with paths expanded and resolved against the base dir.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        settings.knowledge_dir = resolve_with_base(&self.base_dir, settings.knowledge_dir.to_string_lossy());
        settings.artifacts_dir = resolve_with_base(&self.base_dir, settings.artifacts_dir.to_string_lossy());
        for fixture in [&mut settings.eval.rag_fixture, &mut settings.eval.agent_fixture] {
            *fixture = resolve_with_base(&self.base_dir, fixture.to_string_lossy());
        }
        if !settings.trace.path.as_os_str().is_empty() {
            settings.trace.path = resolve_with_base(&self.base_dir, settings.trace.path.to_string_lossy());
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub knowledge_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub eval: EvalSettings,
    pub trace: TraceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            knowledge_dir: PathBuf::from("knowledge"),
            artifacts_dir: PathBuf::from("artifacts"),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalSettings::default(),
            generation: GenerationSettings::default(),
            eval: EvalSettings::default(),
            trace: TraceSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults pointed at explicit directories.
    pub fn with_dirs(knowledge_dir: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self { knowledge_dir: knowledge_dir.into(), artifacts_dir: artifacts_dir.into(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::Configuration("retrieval.top_k must be positive".into()));
        }
        if self.eval.top_k == 0 {
            return Err(Error::Configuration("eval.top_k must be positive".into()));
        }
        Ok(())
    }

    /// Trace log location; defaults to `ai_traces.jsonl` beside the index.
    pub fn trace_path(&self) -> PathBuf {
        if self.trace.path.as_os_str().is_empty() {
            self.artifacts_dir.join("ai_traces.jsonl")
        } else {
            self.trace.path.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub backend: BackendKind,
    pub top_k: usize,
    /// Below this many chunks the accelerated table is scanned without an ANN index.
    pub ann_min_rows: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { backend: BackendKind::Exact, top_k: 3, ann_min_rows: 256 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    None,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: ProviderKind,
    /// Empty selects the provider's default model.
    pub model: String,
    /// Empty falls back to `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`.
    pub api_key: String,
    /// Empty selects the provider's public endpoint.
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::None,
            model: String::new(),
            api_key: String::new(),
            base_url: String::new(),
            timeout_secs: 30,
            max_retries: 1,
            retry_backoff_ms: 500,
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

impl GenerationSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.clone());
        }
        let var = match self.provider {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::None => return None,
        };
        env::var(var).ok().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    pub rag_fixture: PathBuf,
    pub agent_fixture: PathBuf,
    pub top_k: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            rag_fixture: PathBuf::from("eval/rag_eval_set.jsonl"),
            agent_fixture: PathBuf::from("eval/compliance_eval_set.jsonl"),
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    pub enabled: bool,
    /// Empty means `<artifacts_dir>/ai_traces.jsonl`.
    pub path: PathBuf,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self { enabled: true, path: PathBuf::new() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
