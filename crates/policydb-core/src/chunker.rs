//! Fixed-size overlapping windows over document text.
//!
//! Windows are measured in characters (Unicode scalar values), so a window
//! boundary never lands inside a multi-byte sequence.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMeta, Document};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub snippet_len: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 800, overlap: 100, snippet_len: 300 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(Error::InvalidChunking { chunk_size: self.chunk_size, overlap: self.overlap });
        }
        Ok(())
    }
}

/// Split `text` into windows of `chunk_size` characters, each sharing
/// `overlap` characters with its predecessor. Windows are trimmed and empty
/// ones dropped.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(Error::InvalidChunking { chunk_size, overlap });
    }
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_len = bounds.len() - 1;
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        let window = text[bounds[start]..bounds[end]].trim();
        if !window.is_empty() {
            chunks.push(window.to_string());
        }
        start += step;
    }
    Ok(chunks)
}

/// First `len` characters of a chunk, for display.
pub fn snippet(text: &str, len: usize) -> String {
    text.chars().take(len).collect()
}

/// Chunk one document, attaching provenance to every window.
pub fn chunk_document(doc: &Document, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let source_path = doc.path.to_string_lossy().to_string();
    Ok(chunk(&doc.raw_text, config.chunk_size, config.overlap)?
        .into_iter()
        .map(|text| Chunk {
            meta: ChunkMeta {
                source: doc.name.clone(),
                path: source_path.clone(),
                snippet: snippet(&text, config.snippet_len),
            },
            text,
        })
        .collect())
}
