//! On-disk index artifact.
//!
//! Layout of `index.bin`: 4-byte magic, little-endian u32 format version,
//! then the bincode-encoded [`IndexArtifact`]. The file is replaced with a
//! rename so readers never see a partial write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use policydb_core::types::{BackendKind, ChunkMeta};
use policydb_core::{Error, Result};
use policydb_text::{DenseMatrix, TfIdfModel};

pub const ARTIFACT_FILE: &str = "index.bin";
pub const ANN_DIR: &str = "ann";
pub const FORMAT_VERSION: u32 = 1;
const MAGIC: &[u8; 4] = b"PDBX";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub backend_kind: BackendKind,
    pub model: TfIdfModel,
    pub chunk_texts: Vec<String>,
    pub chunk_meta: Vec<ChunkMeta>,
    pub matrix: DenseMatrix,
    pub corpus_fingerprint: String,
    pub document_count: usize,
    pub built_at: DateTime<Utc>,
    /// LanceDB table holding the same rows, when built for the accelerated backend.
    pub ann_table: Option<String>,
}

impl IndexArtifact {
    pub fn chunk_count(&self) -> usize {
        self.chunk_texts.len()
    }

    fn check_consistency(&self) -> Result<()> {
        let n = self.chunk_texts.len();
        if self.chunk_meta.len() != n || self.matrix.rows != n || !self.matrix.is_consistent() {
            return Err(Error::Artifact(format!(
                "row count mismatch: {} texts, {} metadata entries, {} matrix rows",
                n,
                self.chunk_meta.len(),
                self.matrix.rows
            )));
        }
        if self.matrix.cols != self.model.vocabulary_size() {
            return Err(Error::Artifact(format!(
                "matrix has {} columns but vocabulary has {} terms",
                self.matrix.cols,
                self.model.vocabulary_size()
            )));
        }
        Ok(())
    }
}

pub fn artifact_path(artifacts_dir: &Path) -> PathBuf {
    artifacts_dir.join(ARTIFACT_FILE)
}

pub fn ann_dir(artifacts_dir: &Path) -> PathBuf {
    artifacts_dir.join(ANN_DIR)
}

/// Write the artifact atomically into `artifacts_dir`.
pub fn save(artifacts_dir: &Path, artifact: &IndexArtifact) -> Result<()> {
    let payload = bincode::serialize(artifact).map_err(|e| Error::Artifact(e.to_string()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(artifacts_dir).map_err(|e| Error::io(artifacts_dir, e))?;
    let target = artifact_path(artifacts_dir);
    write_framed(tmp.as_file_mut(), &payload).map_err(|e| Error::io(&target, e))?;
    tmp.persist(&target).map_err(|e| Error::io(&target, e.error))?;
    Ok(())
}

fn write_framed(file: &mut fs::File, payload: &[u8]) -> std::io::Result<()> {
    file.write_all(MAGIC)?;
    file.write_all(&FORMAT_VERSION.to_le_bytes())?;
    file.write_all(payload)?;
    file.sync_all()
}

/// Load the artifact from `artifacts_dir`. `Ok(None)` when no index has been built.
pub fn load(artifacts_dir: &Path) -> Result<Option<IndexArtifact>> {
    let path = artifact_path(artifacts_dir);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(&path, e)),
    };
    decode(&bytes).map(Some)
}

fn decode(bytes: &[u8]) -> Result<IndexArtifact> {
    if bytes.len() < 8 || &bytes[..4] != MAGIC {
        return Err(Error::Artifact("not an index artifact".into()));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..8]);
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(Error::Artifact(format!("format version {version}, expected {FORMAT_VERSION}; rebuild the index")));
    }
    let artifact: IndexArtifact = bincode::deserialize(&bytes[8..]).map_err(|e| Error::Artifact(e.to_string()))?;
    artifact.check_consistency()?;
    Ok(artifact)
}
