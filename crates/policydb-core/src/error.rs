use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid settings, including absent provider credentials.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Network failure talking to the text-generation provider.
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("{provider} returned HTTP {status}: {body}")]
    Provider { provider: String, status: u16, body: String },

    /// A single corpus file could not be read. Recoverable: the loader skips it.
    #[error("Failed to extract text from {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("Fixture file not found: {}", .0.display())]
    FixtureNotFound(PathBuf),

    #[error("Malformed fixture {} line {line}: {reason}", path.display())]
    Fixture { path: PathBuf, line: usize, reason: String },

    #[error("Invalid chunking: overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("No chunks to index")]
    EmptyCorpus,

    #[error("Index artifact unusable: {0}")]
    Artifact(String),

    #[error("Vector backend failed: {0}")]
    Backend(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Per-document failures that callers recover from by skipping.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// Failures worth another attempt against the generation provider.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
