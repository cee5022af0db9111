//! Accelerated backend on LanceDB.
//!
//! LanceDB is async; the sync retriever and builder bridge into it through a
//! runtime owned by [`LanceIndex`] / [`write_accelerated`].
pub mod index_build;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use anyhow::Result;
use lancedb::Table;
use std::path::Path;
use tokio::runtime::Runtime;

use policydb_core::types::ChunkMeta;
use policydb_text::DenseMatrix;

/// Read handle on one chunk table.
pub struct LanceIndex {
	rt: Runtime,
	table: Table,
	name: String,
}

impl LanceIndex {
	pub fn open(ann_dir: &Path, table_name: &str) -> Result<Self> {
		let rt = Runtime::new()?;
		let table = rt.block_on(async {
			let conn = table::open_db(ann_dir).await?;
			anyhow::Ok(conn.open_table(table_name).execute().await?)
		})?;
		Ok(Self { rt, table, name: table_name.to_string() })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
		self.rt.block_on(search::search_rows(&self.table, query, k))
	}
}

/// Write a new chunk table (plus ANN index when large enough) and return its name.
pub fn write_accelerated(ann_dir: &Path, matrix: &DenseMatrix, meta: &[ChunkMeta], ann_min_rows: usize) -> Result<String> {
	std::fs::create_dir_all(ann_dir)?;
	let rt = Runtime::new()?;
	rt.block_on(async {
		let conn = table::open_db(ann_dir).await?;
		let name = table::next_table_name(&conn).await?;
		writer::write_chunk_table(&conn, &name, matrix, meta).await?;
		index_build::build_ann_index(&conn, &name, ann_min_rows).await?;
		Ok(name)
	})
}
