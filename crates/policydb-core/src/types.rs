//! Domain types used by the loader, index builder, retriever and agent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A source file read from the knowledge directory.
///
/// - `name`: file name, doubles as the citation source
/// - `path`: original path to the file
/// - `raw_text`: extracted text payload
/// - `checksum`: hex SHA-256 of `raw_text`, used for change detection
///
/// Identity is `(name, path)`. Documents are never updated in place; a changed
/// file is re-read into a new `Document` with a new checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    pub raw_text: String,
    pub checksum: String,
}

/// Provenance carried alongside every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub source: String,
    pub path: String,
    pub snippet: String,
}

/// A window of a document's text; the unit of indexing and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub meta: ChunkMeta,
}

/// Which search structure an index artifact was built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Brute-force dot products over the dense matrix.
    #[default]
    Exact,
    /// Nearest-neighbour search through a LanceDB table.
    Accelerated,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Accelerated => "accelerated",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked passage. Higher `score` is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub score: f32,
    pub source: String,
    pub snippet: String,
}

/// Results of a single query, in descending score order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    pub results: Vec<RetrievalResult>,
    pub latency_ms: u64,
    /// Query terms that are not part of the fitted vocabulary.
    pub unmatched_terms: Vec<String>,
}

impl Retrieval {
    /// The answer for a corpus that has not been indexed yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
