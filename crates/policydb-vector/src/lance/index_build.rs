use anyhow::Result;
use lancedb::index::{vector::IvfFlatIndexBuilder, Index};
use lancedb::{Connection, DistanceType};
use tracing::info;

use super::schema::VECTOR_COLUMN;

/// Partition count for an IVF index over `rows` vectors: about sqrt(n),
/// clamped below the row count.
pub fn compute_nlist(rows: usize) -> u32 {
	if rows <= 1 {
		return 1;
	}
	let sqrt_n = (rows as f64).sqrt() as usize;
	sqrt_n.clamp(1, rows - 1) as u32
}

/// Build an IVF_FLAT dot-product index on the table's vector column.
/// Tables smaller than `min_rows` are left to LanceDB's flat scan.
pub async fn build_ann_index(conn: &Connection, table_name: &str, min_rows: usize) -> Result<bool> {
	let table = conn.open_table(table_name).execute().await?;
	let rows = table.count_rows(None).await?;
	if rows < min_rows {
		info!(rows, min_rows, "table below ANN threshold; using flat scan");
		return Ok(false);
	}
	let nlist = compute_nlist(rows);
	info!(rows, nlist, table = table_name, "building IVF_FLAT index");
	table
		.create_index(
			&[VECTOR_COLUMN],
			Index::IvfFlat(IvfFlatIndexBuilder::default().distance_type(DistanceType::Dot).num_partitions(nlist)),
		)
		.execute()
		.await?;
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nlist_tracks_square_root() {
		assert_eq!(compute_nlist(0), 1);
		assert_eq!(compute_nlist(1), 1);
		assert_eq!(compute_nlist(2), 1);
		assert_eq!(compute_nlist(256), 16);
		assert_eq!(compute_nlist(10_000), 100);
	}
}
