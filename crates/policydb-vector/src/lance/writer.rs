use anyhow::Result;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;
use tracing::info;

use policydb_core::types::ChunkMeta;
use policydb_text::DenseMatrix;

use super::schema::chunk_schema;

const BATCH_SIZE: usize = 1000;

/// Create `table_name` and fill it with one row per matrix row.
pub async fn write_chunk_table(conn: &Connection, table_name: &str, matrix: &DenseMatrix, meta: &[ChunkMeta]) -> Result<()> {
	anyhow::ensure!(matrix.rows == meta.len(), "matrix rows and chunk metadata length must match");
	anyhow::ensure!(matrix.cols > 0, "cannot store zero-dimensional vectors");
	let dim = i32::try_from(matrix.cols)?;
	info!(rows = matrix.rows, dim, table = table_name, "writing accelerated table");

	let pb = ProgressBar::new(matrix.rows as u64);
	pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
	let mut created = false;
	let mut start = 0usize;
	while start < matrix.rows {
		let end = (start + BATCH_SIZE).min(matrix.rows);
		let batch = rows_to_record_batch(matrix, meta, start, end, dim)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		if created {
			conn.open_table(table_name).execute().await?.add(reader).execute().await?;
		} else {
			conn.create_table(table_name, reader).execute().await?;
			created = true;
		}
		pb.set_position(end as u64);
		start = end;
	}
	pb.finish_with_message("done");
	Ok(())
}

fn rows_to_record_batch(matrix: &DenseMatrix, meta: &[ChunkMeta], start: usize, end: usize, dim: i32) -> Result<RecordBatch> {
	let mut rows = Vec::with_capacity(end - start);
	let mut sources = Vec::with_capacity(end - start);
	let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(end - start);
	for i in start..end {
		rows.push(u32::try_from(i)?);
		sources.push(meta[i].source.clone());
		vectors.push(Some(matrix.row(i).iter().map(|&x| Some(x)).collect()));
	}
	let record_batch = RecordBatch::try_new(chunk_schema(dim), vec![
		Arc::new(UInt32Array::from(rows)),
		Arc::new(StringArray::from(sources)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
	])?;
	Ok(record_batch)
}
