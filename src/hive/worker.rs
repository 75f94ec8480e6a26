//! A single worker: load one work group, bucket its rows, write partitions.

use arrow::array::{Array, ArrayRef, RecordBatch, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::partition::{partition_path, write_or_merge};
use super::planner::{GroupEntry, WorkGroup};
use super::HiveOptions;
use crate::bucket::bucket_column;
use crate::constants::{ID_COLUMN, PARTITION_COLUMN};
use crate::error::{HiveError, Result};
use crate::table;

/// One partition file written by a worker.
#[derive(Debug, Clone)]
pub struct PartitionWrite {
    pub bucket: u64,
    pub path: PathBuf,
    /// Rows this worker added to the file.
    pub rows: usize,
}

/// What a worker did with its group.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub label: String,
    pub group: usize,
    pub rows_read: usize,
    pub partitions: Vec<PartitionWrite>,
}

impl WorkerReport {
    /// Rows written across all partitions.
    pub fn rows_written(&self) -> usize {
        self.partitions.iter().map(|p| p.rows).sum()
    }
}

/// Process one work group and merge its rows into the hive under `output_prefix`.
///
/// `worker_label` names the partition files; the caller guarantees that no
/// other running worker uses the same label.
pub fn run_worker(
    group: &WorkGroup,
    output_prefix: &Path,
    worker_label: &str,
    options: &HiveOptions,
) -> Result<WorkerReport> {
    log::info!(
        "Worker {} processing group {} ({} files, {} placeholders)",
        worker_label,
        group.index,
        group.files().count(),
        group.placeholders()
    );

    let (schema, batches) = load_group(group, options.bucket_count)?;
    let combined = table::concat(&schema, &batches)?;
    let rows_read = combined.num_rows();
    if rows_read > u32::MAX as usize {
        let first = group.files().next().unwrap_or(Path::new(""));
        return Err(HiveError::input(
            first,
            format!(
                "work group {} has {} rows, more than a single group can index",
                group.index, rows_read
            ),
        ));
    }

    let bucket_idx = schema.fields().len() - 1;
    let buckets = combined
        .column(bucket_idx)
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| {
            HiveError::internal(format!("'{}' column is not UInt64", PARTITION_COLUMN))
        })?;
    let rows_by_bucket = group_rows_by_bucket(buckets);

    // The bucket is encoded in the directory name; drop the auxiliary column.
    let data_columns: Vec<usize> = (0..bucket_idx).collect();
    let data = combined.project(&data_columns)?;

    let mut partitions = Vec::with_capacity(rows_by_bucket.len());
    for (bucket, rows) in rows_by_bucket {
        let path = partition_path(output_prefix, bucket, worker_label);
        let batch = table::take_rows(&data, &rows)?;
        write_or_merge(&batch, &path, &options.write)?;
        partitions.push(PartitionWrite {
            bucket,
            path,
            rows: rows.len(),
        });
    }

    log::info!(
        "Worker {} finished group {}: {} rows into {} partitions",
        worker_label,
        group.index,
        rows_read,
        partitions.len()
    );

    Ok(WorkerReport {
        label: worker_label.to_string(),
        group: group.index,
        rows_read,
        partitions,
    })
}

/// Load every entry of `group` with the `id_mod` column appended.
///
/// All batches are returned under one shared schema: the first file's
/// columns followed by `id_mod`.
fn load_group(group: &WorkGroup, bucket_count: u64) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let mut expected: Option<(SchemaRef, SchemaRef)> = None;
    let mut batches = Vec::with_capacity(group.entries.len());

    for entry in &group.entries {
        let (batch, origin) = match entry {
            GroupEntry::File(path) => (table::read_batch(path)?, path.as_path()),
            GroupEntry::Placeholder { schema, source } => {
                (RecordBatch::new_empty(schema.clone()), source.as_path())
            }
        };

        let (data_schema, bucketed_schema) = match &expected {
            Some(schemas) => schemas.clone(),
            None => {
                let schemas = (batch.schema(), with_bucket_field(&batch.schema(), origin)?);
                expected = Some(schemas.clone());
                schemas
            }
        };

        if !table::same_columns(&data_schema, &batch.schema()) {
            return Err(HiveError::input(
                origin,
                format!(
                    "schema{} does not match the rest of its group (expected {:?}, got {:?})",
                    if matches!(entry, GroupEntry::Placeholder { .. }) {
                        " (padding the last group)"
                    } else {
                        ""
                    },
                    data_schema.fields(),
                    batch.schema().fields()
                ),
            ));
        }

        let ids = batch.column_by_name(ID_COLUMN).ok_or_else(|| {
            HiveError::input(origin, format!("missing required column '{}'", ID_COLUMN))
        })?;
        let buckets: ArrayRef = Arc::new(bucket_column(ids.as_ref(), bucket_count, origin)?);

        let mut columns = batch.columns().to_vec();
        columns.push(buckets);
        batches.push(
            RecordBatch::try_new(bucketed_schema, columns)
                .map_err(|e| HiveError::parquet_at(origin, "attach bucket column to", e))?,
        );
    }

    let (_, schema) = expected
        .ok_or_else(|| HiveError::internal(format!("work group {} is empty", group.index)))?;
    Ok((schema, batches))
}

fn with_bucket_field(schema: &Schema, origin: &Path) -> Result<SchemaRef> {
    if schema.column_with_name(PARTITION_COLUMN).is_some() {
        return Err(HiveError::input(
            origin,
            format!(
                "column '{}' is reserved for the partition key",
                PARTITION_COLUMN
            ),
        ));
    }

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(PARTITION_COLUMN, DataType::UInt64, false));
    Ok(Arc::new(Schema::new(fields)))
}

/// Row indices of each bucket, in input order. Single pass, buckets ordered.
///
/// The caller guarantees at most `u32::MAX` rows.
fn group_rows_by_bucket(buckets: &UInt64Array) -> BTreeMap<u64, Vec<u32>> {
    let mut rows_by_bucket: BTreeMap<u64, Vec<u32>> = BTreeMap::new();
    for (row, &bucket) in buckets.values().iter().enumerate() {
        rows_by_bucket.entry(bucket).or_default().push(row as u32);
    }
    rows_by_bucket
}
