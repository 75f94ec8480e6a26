//! Thin layer over Arrow and Parquet used by the hive pipeline.
//!
//! Everything the pipeline needs from the columnar engine goes through here:
//! lazy schema scan, eager read, concatenation, row selection and write.

mod options;

pub use options::{ParquetCompression, ParquetWriteOptions};

use arrow::array::{RecordBatch, UInt32Array};
use arrow::compute::{concat_batches, take_record_batch};
use arrow::datatypes::{Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;

use crate::error::{HiveError, Result};

fn open_reader(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>> {
    let file = File::open(path).map_err(|e| HiveError::io(path, "open parquet file", e))?;
    ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| HiveError::parquet_at(path, "read footer of", e))
}

/// Read the schema of a Parquet file from its footer, without loading data.
pub fn scan_schema(path: &Path) -> Result<SchemaRef> {
    Ok(open_reader(path)?.schema().clone())
}

/// Read a whole Parquet file into a single batch.
pub fn read_batch(path: &Path) -> Result<RecordBatch> {
    let builder = open_reader(path)?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| HiveError::parquet_at(path, "build reader for", e))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.map_err(|e| HiveError::parquet_at(path, "decode", e))?);
    }

    concat_batches(&schema, &batches).map_err(|e| HiveError::parquet_at(path, "concatenate", e))
}

/// Concatenate batches that share `schema`, keeping their order.
pub fn concat(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    Ok(concat_batches(schema, batches)?)
}

/// Select rows by index, in the given order.
pub fn take_rows(batch: &RecordBatch, rows: &[u32]) -> Result<RecordBatch> {
    let indices = UInt32Array::from(rows.to_vec());
    Ok(take_record_batch(batch, &indices)?)
}

/// Write a batch as a new Parquet file, replacing any file at `path`.
pub fn write_batch(path: &Path, batch: &RecordBatch, options: &ParquetWriteOptions) -> Result<()> {
    let props = options.to_writer_properties()?;
    let file = File::create(path).map_err(|e| HiveError::io(path, "create partition file", e))?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| HiveError::parquet_at(path, "open writer for", e))?;
    writer
        .write(batch)
        .map_err(|e| HiveError::parquet_at(path, "write", e))?;
    writer
        .close()
        .map_err(|e| HiveError::parquet_at(path, "close", e))?;

    Ok(())
}

/// Column-wise schema equality, ignoring schema-level metadata.
///
/// Files written by different tools carry different key/value metadata even
/// when their columns match.
pub fn same_columns(a: &Schema, b: &Schema) -> bool {
    a.fields().len() == b.fields().len()
        && a.fields().iter().zip(b.fields().iter()).all(|(x, y)| {
            x.name() == y.name()
                && x.data_type() == y.data_type()
                && x.is_nullable() == y.is_nullable()
        })
}
