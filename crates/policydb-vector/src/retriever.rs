//! Query-time access to a built index.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

use policydb_core::config::Settings;
use policydb_core::traits::PassageRetriever;
use policydb_core::types::{BackendKind, Retrieval, RetrievalResult};
use policydb_core::Result;

use crate::artifact::{self, IndexArtifact};
use crate::exact;

enum Backend {
    Exact,
    #[cfg(feature = "lance")]
    Accelerated(crate::lance::LanceIndex),
}

struct LoadedIndex {
    artifact: IndexArtifact,
    backend: Backend,
}

/// Read-only handle on the index in an artifacts directory.
///
/// A directory without an index yields a handle that answers every query
/// with no results.
pub struct Retriever {
    artifacts_dir: PathBuf,
    index: Option<LoadedIndex>,
}

impl Retriever {
    pub fn open(settings: &Settings) -> Result<Self> {
        Self::open_dir(&settings.artifacts_dir)
    }

    pub fn open_dir(artifacts_dir: &Path) -> Result<Self> {
        let index = match artifact::load(artifacts_dir)? {
            Some(artifact) => {
                let backend = open_backend(artifacts_dir, &artifact);
                Some(LoadedIndex { artifact, backend })
            }
            None => {
                debug!(dir = %artifacts_dir.display(), "no index artifact; retrieval returns nothing");
                None
            }
        };
        Ok(Self { artifacts_dir: artifacts_dir.to_path_buf(), index })
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn chunk_count(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.artifact.chunk_count())
    }

    /// Backend actually serving queries, which may differ from the one the
    /// artifact was built for when the accelerated table is unavailable.
    pub fn backend(&self) -> Option<BackendKind> {
        self.index.as_ref().map(|i| match i.backend {
            Backend::Exact => BackendKind::Exact,
            #[cfg(feature = "lance")]
            Backend::Accelerated(_) => BackendKind::Accelerated,
        })
    }

    /// Top `top_k` chunks for `query`, best first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        let Some(index) = &self.index else { return Ok(Retrieval::empty()) };
        if top_k == 0 {
            return Ok(Retrieval::empty());
        }
        let start = Instant::now();
        let q = index.artifact.model.transform(query);
        if !q.unmatched_terms.is_empty() {
            debug!(terms = ?q.unmatched_terms, "query terms outside vocabulary");
        }
        let hits = index.search(&q.values, top_k)?;
        let results = hits
            .into_iter()
            .filter_map(|(row, score)| index.result(row, score))
            .collect();
        let latency_ms = start.elapsed().as_millis() as u64;
        Ok(Retrieval { results, latency_ms, unmatched_terms: q.unmatched_terms })
    }
}

/// Open a fresh handle and run one query; load time counts toward latency.
pub fn retrieve_once(settings: &Settings, query: &str, top_k: usize) -> Result<Retrieval> {
    let start = Instant::now();
    let retriever = Retriever::open(settings)?;
    if !retriever.is_built() {
        return Ok(Retrieval::empty());
    }
    let mut retrieval = retriever.retrieve(query, top_k)?;
    retrieval.latency_ms = start.elapsed().as_millis() as u64;
    Ok(retrieval)
}

impl LoadedIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        match &self.backend {
            Backend::Exact => Ok(exact::search(&self.artifact.matrix, query, k)),
            #[cfg(feature = "lance")]
            Backend::Accelerated(lance) => {
                let mut hits = lance
                    .search(query, k)
                    .map_err(|e| policydb_core::Error::Backend(e.to_string()))?;
                exact::rank(&mut hits);
                hits.truncate(k);
                Ok(hits)
            }
        }
    }

    fn result(&self, row: usize, score: f32) -> Option<RetrievalResult> {
        let (Some(text), Some(meta)) = (self.artifact.chunk_texts.get(row), self.artifact.chunk_meta.get(row)) else {
            warn!(row, "search returned a row outside the artifact");
            return None;
        };
        Some(RetrievalResult { text: text.clone(), score, source: meta.source.clone(), snippet: meta.snippet.clone() })
    }
}

#[cfg(feature = "lance")]
fn open_backend(artifacts_dir: &Path, artifact: &IndexArtifact) -> Backend {
    let (BackendKind::Accelerated, Some(table)) = (artifact.backend_kind, artifact.ann_table.as_deref()) else {
        return Backend::Exact;
    };
    match crate::lance::LanceIndex::open(&artifact::ann_dir(artifacts_dir), table) {
        Ok(index) => {
            debug!(table = index.name(), "serving from accelerated table");
            Backend::Accelerated(index)
        }
        Err(e) => {
            warn!(table, error = %e, "accelerated table unavailable; using exact search");
            Backend::Exact
        }
    }
}

#[cfg(not(feature = "lance"))]
fn open_backend(_artifacts_dir: &Path, artifact: &IndexArtifact) -> Backend {
    if artifact.backend_kind == BackendKind::Accelerated {
        warn!("index was built for the accelerated backend but this build lacks the `lance` feature; using exact search");
    }
    Backend::Exact
}

impl PassageRetriever for Retriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        Retriever::retrieve(self, query, top_k)
    }

    fn kind(&self) -> &str {
        self.backend().map_or("none", |b| b.as_str())
    }
}
