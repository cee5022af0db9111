use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use policydb_core::config::Settings;
use policydb_core::loader::{corpus_fingerprint, load_docs};
use policydb_core::types::BackendKind;
use policydb_core::Result;

use crate::artifact;

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub present: bool,
    pub chunk_count: usize,
    pub document_count: usize,
    pub backend: Option<BackendKind>,
    pub ann_table: Option<String>,
    pub built_at: Option<DateTime<Utc>>,
    /// `None` when the knowledge directory cannot be read for comparison.
    pub stale: Option<bool>,
}

/// Describe the index in `settings.artifacts_dir` and whether the knowledge
/// directory has changed since it was built.
pub fn index_status(settings: &Settings) -> Result<IndexStatus> {
    let Some(artifact) = artifact::load(&settings.artifacts_dir)? else {
        return Ok(IndexStatus {
            present: false,
            chunk_count: 0,
            document_count: 0,
            backend: None,
            ann_table: None,
            built_at: None,
            stale: None,
        });
    };
    let stale = match load_docs(&settings.knowledge_dir) {
        Ok(docs) => Some(corpus_fingerprint(&docs) != artifact.corpus_fingerprint),
        Err(e) => {
            warn!(error = %e, "cannot compare index against knowledge directory");
            None
        }
    };
    Ok(IndexStatus {
        present: true,
        chunk_count: artifact.chunk_count(),
        document_count: artifact.document_count,
        backend: Some(artifact.backend_kind),
        ann_table: artifact.ann_table,
        built_at: Some(artifact.built_at),
        stale,
    })
}
