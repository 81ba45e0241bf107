use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const POSITION_COLUMN: &str = "position";
pub const VECTOR_COLUMN: &str = "vector";

pub fn build_vector_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(POSITION_COLUMN, DataType::Int64, false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
	]))
}

/// Dimension declared by a vector table schema.
pub fn schema_dim(schema: &Schema) -> Result<usize> {
	match schema.field_with_name(VECTOR_COLUMN)?.data_type() {
		DataType::FixedSizeList(_, n) => Ok(*n as usize),
		other => Err(anyhow!("vector column has unexpected type {:?}", other)),
	}
}

/// Rows `0..vectors.len()`, position = row index.
pub fn vectors_to_batch<'a, I>(vectors: I, dim: usize) -> Result<RecordBatch>
where
	I: IntoIterator<Item = &'a Vec<f32>>,
{
	let mut positions = Vec::new();
	let mut values: Vec<Option<Vec<Option<f32>>>> = Vec::new();
	for (i, v) in vectors.into_iter().enumerate() {
		positions.push(i as i64);
		values.push(Some(v.iter().map(|&x| Some(x)).collect()));
	}
	let batch = RecordBatch::try_new(build_vector_schema(dim), vec![
		Arc::new(Int64Array::from(positions)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(values, dim as i32)),
	])?;
	Ok(batch)
}

pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<(i64, Vec<f32>)>> {
	let positions = batch
		.column_by_name(POSITION_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<Int64Array>())
		.ok_or_else(|| anyhow!("position column missing"))?;
	let vectors = batch
		.column_by_name(VECTOR_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
		.ok_or_else(|| anyhow!("vector column missing"))?;
	let mut rows = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let item = vectors.value(i);
		let floats = item
			.as_any()
			.downcast_ref::<Float32Array>()
			.ok_or_else(|| anyhow!("vector items are not f32"))?;
		rows.push((positions.value(i), floats.values().to_vec()));
	}
	Ok(rows)
}
