//! Offline index construction: documents -> chunks -> TF-IDF -> artifact.

use chrono::Utc;
use serde::Serialize;
use std::fs;
use tracing::{info, warn};

use policydb_core::chunker::chunk_document;
use policydb_core::config::Settings;
use policydb_core::loader::{corpus_fingerprint, load_docs};
use policydb_core::types::{BackendKind, Chunk, Document};
use policydb_core::{Error, Result};
use policydb_text::TfIdfModel;

use crate::artifact::{self, IndexArtifact};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub chunk_count: usize,
    pub top_k: usize,
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub backend: BackendKind,
}

pub struct IndexBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Replace the index in `settings.artifacts_dir` with one built from `documents`.
    ///
    /// Nothing is written when the documents yield no chunks.
    pub fn build(&self, documents: &[Document], top_k: usize) -> Result<BuildSummary> {
        let chunks = self.chunk_all(documents)?;
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let (model, matrix) = TfIdfModel::fit(&texts);
        info!(chunks = chunks.len(), vocabulary = model.vocabulary_size(), "fitted term weights");

        let backend = self.resolve_backend(model.vocabulary_size());
        let artifacts_dir = &self.settings.artifacts_dir;
        fs::create_dir_all(artifacts_dir).map_err(|e| Error::io(artifacts_dir, e))?;

        let (chunk_texts, chunk_meta): (Vec<String>, Vec<_>) = chunks.into_iter().map(|c| (c.text, c.meta)).unzip();
        let ann_table = match backend {
            BackendKind::Exact => None,
            BackendKind::Accelerated => Some(self.write_accelerated(&matrix, &chunk_meta)?),
        };

        let summary = BuildSummary {
            chunk_count: chunk_texts.len(),
            top_k,
            document_count: documents.len(),
            vocabulary_size: model.vocabulary_size(),
            backend,
        };
        let artifact = IndexArtifact {
            backend_kind: backend,
            model,
            chunk_texts,
            chunk_meta,
            matrix,
            corpus_fingerprint: corpus_fingerprint(documents),
            document_count: documents.len(),
            built_at: Utc::now(),
            ann_table,
        };
        artifact::save(artifacts_dir, &artifact)?;
        self.prune_tables(artifact.ann_table.as_deref());
        info!(chunks = summary.chunk_count, backend = %summary.backend, dir = %artifacts_dir.display(), "index written");
        Ok(summary)
    }

    fn chunk_all(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for doc in documents {
            chunks.extend(chunk_document(doc, &self.settings.chunking)?);
        }
        Ok(chunks)
    }

    fn resolve_backend(&self, vocabulary_size: usize) -> BackendKind {
        match self.settings.retrieval.backend {
            BackendKind::Exact => BackendKind::Exact,
            BackendKind::Accelerated if !cfg!(feature = "lance") => {
                warn!("accelerated backend requested but built without the `lance` feature; using exact search");
                BackendKind::Exact
            }
            BackendKind::Accelerated if vocabulary_size == 0 => {
                warn!("vocabulary is empty; using exact search");
                BackendKind::Exact
            }
            BackendKind::Accelerated => BackendKind::Accelerated,
        }
    }

    #[cfg(feature = "lance")]
    fn write_accelerated(&self, matrix: &policydb_text::DenseMatrix, meta: &[policydb_core::types::ChunkMeta]) -> Result<String> {
        let ann_dir = artifact::ann_dir(&self.settings.artifacts_dir);
        crate::lance::write_accelerated(&ann_dir, matrix, meta, self.settings.retrieval.ann_min_rows)
            .map_err(|e| Error::Backend(e.to_string()))
    }

    #[cfg(not(feature = "lance"))]
    fn write_accelerated(&self, _matrix: &policydb_text::DenseMatrix, _meta: &[policydb_core::types::ChunkMeta]) -> Result<String> {
        Err(Error::Backend("built without the `lance` feature".into()))
    }

    #[cfg(feature = "lance")]
    fn prune_tables(&self, keep: Option<&str>) {
        let removed = crate::lance::table::prune_stale_tables(&artifact::ann_dir(&self.settings.artifacts_dir), keep);
        if removed > 0 {
            info!(removed, "pruned stale accelerated tables");
        }
    }

    #[cfg(not(feature = "lance"))]
    fn prune_tables(&self, _keep: Option<&str>) {}
}

/// Load the configured knowledge directory and rebuild the index from it.
pub fn rebuild(settings: &Settings, top_k: usize) -> Result<BuildSummary> {
    let documents = load_docs(&settings.knowledge_dir)?;
    IndexBuilder::new(settings).build(&documents, top_k)
}
