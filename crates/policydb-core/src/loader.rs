//! Corpus discovery and text extraction for the knowledge directory.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::Document;

const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];
const PDF_EXTENSION: &str = "pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    PlainText,
    Pdf,
}

fn source_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::PlainText)
    } else if ext == PDF_EXTENSION {
        Some(SourceFormat::Pdf)
    } else {
        None
    }
}

/// Load every recognized file directly inside `directory` (no recursion).
///
/// Files that fail extraction are logged and skipped; only an unreadable
/// directory is fatal. Output is ordered by file name.
pub fn load_docs(directory: &Path) -> Result<Vec<Document>> {
    if !directory.is_dir() {
        return Err(Error::io(directory, io::Error::new(io::ErrorKind::NotFound, "knowledge directory does not exist")));
    }
    let mut docs = Vec::new();
    let walker = walkdir::WalkDir::new(directory).min_depth(1).max_depth(1).follow_links(true).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match load_document(entry.path()) {
            Ok(Some(doc)) => docs.push(doc),
            Ok(None) => debug!(path = %entry.path().display(), "skipping unrecognized file type"),
            Err(e) if e.is_soft() => warn!(error = %e, "skipping document"),
            Err(e) => return Err(e),
        }
    }
    info!(count = docs.len(), dir = %directory.display(), "loaded knowledge documents");
    Ok(docs)
}

/// Read a single file. `Ok(None)` for extensions the loader does not handle.
pub fn load_document(path: &Path) -> Result<Option<Document>> {
    let Some(format) = source_format(path) else { return Ok(None) };
    let raw_text = match format {
        SourceFormat::PlainText => read_plain_text(path)?,
        SourceFormat::Pdf => read_pdf(path)?,
    };
    let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    let checksum = checksum(&raw_text);
    Ok(Some(Document { name, path: path.to_path_buf(), raw_text, checksum }))
}

fn read_plain_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::Extraction { path: path.to_path_buf(), reason: e.to_string() })?;
    Ok(decode_utf8_ignoring_invalid(&bytes))
}

/// Decode UTF-8, dropping invalid byte sequences instead of substituting them.
fn decode_utf8_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for piece in bytes.utf8_chunks() {
        out.push_str(piece.valid());
    }
    out
}

fn read_pdf(path: &Path) -> Result<String> {
    let pdf = lopdf::Document::load(path).map_err(|e| Error::Extraction { path: path.to_path_buf(), reason: e.to_string() })?;
    let pages: Vec<String> = pdf
        .get_pages()
        .keys()
        .map(|&page| {
            pdf.extract_text(&[page]).unwrap_or_else(|e| {
                debug!(path = %path.display(), page, error = %e, "page extraction failed");
                String::new()
            })
        })
        .collect();
    Ok(pages.join("\n"))
}

/// Hex SHA-256 of extracted text.
pub fn checksum(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Order-independent digest of a corpus, derived from `(name, checksum)` pairs.
pub fn corpus_fingerprint(docs: &[Document]) -> String {
    let mut pairs: Vec<(&str, &str)> = docs.iter().map(|d| (d.name.as_str(), d.checksum.as_str())).collect();
    pairs.sort_unstable();
    let mut hasher = Sha256::new();
    for (name, sum) in pairs {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(sum.as_bytes());
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_bytes_are_dropped() {
        let bytes = b"poli\xffcy\xfe text";
        assert_eq!(decode_utf8_ignoring_invalid(bytes), "policy text");
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(source_format(Path::new("a.TXT")), Some(SourceFormat::PlainText));
        assert_eq!(source_format(Path::new("b.Pdf")), Some(SourceFormat::Pdf));
        assert_eq!(source_format(Path::new("c.docx")), None);
        assert_eq!(source_format(Path::new("README")), None);
    }

    #[test]
    fn checksum_is_sha256_hex() {
        assert_eq!(checksum(""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }
}
