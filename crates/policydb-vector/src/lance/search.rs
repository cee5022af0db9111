use anyhow::Result;
use arrow_array::{Float32Array, UInt32Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use super::schema::{DISTANCE_COLUMN, ROW_COLUMN};

/// Nearest rows by dot product, as `(row, score)` with `score = 1 - distance`.
pub async fn search_rows(table: &Table, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
	let mut stream = table.vector_search(query.to_vec())?.distance_type(DistanceType::Dot).limit(k).execute().await?;
	let mut hits = Vec::new();
	while let Some(batch) = stream.try_next().await? {
		let rows = batch
			.column_by_name(ROW_COLUMN)
			.and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
			.ok_or_else(|| anyhow::anyhow!("{ROW_COLUMN} column missing"))?;
		let distances = batch
			.column_by_name(DISTANCE_COLUMN)
			.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
			.ok_or_else(|| anyhow::anyhow!("{DISTANCE_COLUMN} column missing"))?;
		for i in 0..batch.num_rows() {
			hits.push((rows.value(i) as usize, 1.0 - distances.value(i)));
		}
	}
	Ok(hits)
}
