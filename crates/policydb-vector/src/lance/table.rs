//! LanceDB connection and table naming helpers.
use anyhow::Result;
use chrono::Utc;
use lancedb::{connect, Connection};
use std::path::Path;

pub const TABLE_PREFIX: &str = "chunks_";
const TABLE_SUFFIX: &str = ".lance";

pub async fn open_db(dir: &Path) -> Result<Connection> {
	Ok(connect(dir.to_string_lossy().as_ref()).execute().await?)
}

/// A fresh `chunks_<timestamp>` name not yet used in `conn`.
pub async fn next_table_name(conn: &Connection) -> Result<String> {
	let existing = conn.table_names().execute().await?;
	let base = format!("{}{}", TABLE_PREFIX, Utc::now().format("%Y%m%d%H%M%S%3f"));
	let mut name = base.clone();
	let mut n = 1;
	while existing.contains(&name) {
		name = format!("{}_{}", base, n);
		n += 1;
	}
	Ok(name)
}

/// Table name for a `chunks_*.lance` directory entry, if it is one.
pub fn table_name_from_dir(file_name: &str) -> Option<&str> {
	file_name.strip_suffix(TABLE_SUFFIX).filter(|n| n.starts_with(TABLE_PREFIX))
}

/// Delete every `chunks_*` table directory under `ann_dir` except `keep`.
/// Returns the number removed; individual failures are logged and skipped.
pub fn prune_stale_tables(ann_dir: &Path, keep: Option<&str>) -> usize {
	let Ok(entries) = std::fs::read_dir(ann_dir) else { return 0 };
	let mut removed = 0;
	for entry in entries.flatten() {
		let file_name = entry.file_name();
		let Some(name) = file_name.to_str().and_then(table_name_from_dir) else { continue };
		if Some(name) == keep {
			continue;
		}
		match std::fs::remove_dir_all(entry.path()) {
			Ok(()) => removed += 1,
			Err(e) => tracing::warn!(table = name, error = %e, "failed to remove stale table"),
		}
	}
	removed
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recognizes_chunk_table_dirs() {
		assert_eq!(table_name_from_dir("chunks_20240101120000000.lance"), Some("chunks_20240101120000000"));
		assert_eq!(table_name_from_dir("meta.lance"), None);
		assert_eq!(table_name_from_dir("chunks_1"), None);
	}
}
