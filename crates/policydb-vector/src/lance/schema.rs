use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ROW_COLUMN: &str = "row";
pub const SOURCE_COLUMN: &str = "source";
pub const VECTOR_COLUMN: &str = "vector";
pub const DISTANCE_COLUMN: &str = "_distance";

/// One row per chunk: its position in the artifact, its source document and
/// its normalized TF-IDF vector.
pub fn chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ROW_COLUMN, DataType::UInt32, false),
		Field::new(SOURCE_COLUMN, DataType::Utf8, false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
