use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use policydb_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetrievalFixture {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub expected_keywords: Vec<String>,
    #[serde(default = "default_min_hits")]
    pub min_hits: usize,
}

fn default_min_hits() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentFixture {
    #[serde(default)]
    pub draft: String,
    #[serde(default)]
    pub expected_missing: Vec<String>,
}

/// Parse one JSON object per non-blank line. Any malformed line fails the
/// whole file with its 1-based line number.
pub fn read_fixtures<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let body = match fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::FixtureNotFound(path.to_path_buf())),
        Err(e) => return Err(Error::io(path, e)),
    };
    let mut out = Vec::new();
    for (i, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|e| Error::Fixture {
            path: path.to_path_buf(),
            line: i + 1,
            reason: e.to_string(),
        })?;
        out.push(item);
    }
    Ok(out)
}
