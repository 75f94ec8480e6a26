//! Partition layout and append-or-create merge of partition files.
//!
//! ```text
//! {output_prefix}/
//! ├── _hive.toml
//! ├── id_mod=0/
//! │   ├── 0.parquet        # rows written by pool slot 0
//! │   └── 1.parquet        # rows written by pool slot 1
//! └── id_mod=1/
//!     └── 0.parquet
//! ```

use arrow::array::RecordBatch;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{PARTITION_COLUMN, PARTITION_EXTENSION};
use crate::error::{HiveError, Result};
use crate::table::{self, ParquetWriteOptions};

/// Directory holding every partition file of `bucket`.
pub fn partition_dir(output_prefix: &Path, bucket: u64) -> PathBuf {
    output_prefix.join(format!("{}={}", PARTITION_COLUMN, bucket))
}

/// Partition file written by the worker labelled `worker_label`.
pub fn partition_path(output_prefix: &Path, bucket: u64, worker_label: &str) -> PathBuf {
    partition_dir(output_prefix, bucket).join(format!("{}.{}", worker_label, PARTITION_EXTENSION))
}

/// Parse the bucket out of an `id_mod=<bucket>` directory name.
pub fn parse_partition_dir(name: &str) -> Option<u64> {
    name.strip_prefix(PARTITION_COLUMN)?
        .strip_prefix('=')?
        .parse()
        .ok()
}

/// Append `batch` to the partition file at `path`, creating it if needed.
///
/// An existing file is read fully, the new rows are concatenated after the
/// old ones and the file is rewritten. This is a read-modify-write with no
/// locking: only one writer may target `path` at a time.
///
/// Returns the number of rows in the file after the write.
pub fn write_or_merge(
    batch: &RecordBatch,
    path: &Path,
    options: &ParquetWriteOptions,
) -> Result<usize> {
    if path.exists() {
        let existing = table::read_batch(path)?;

        if !table::same_columns(&existing.schema(), &batch.schema()) {
            return Err(HiveError::input(
                path,
                format!(
                    "schema of new rows does not match existing partition file (existing: {:?}, new: {:?})",
                    existing.schema().fields(),
                    batch.schema().fields()
                ),
            ));
        }

        // Relabel the new rows with the on-disk schema so field metadata
        // differences do not reach the writer.
        let incoming = RecordBatch::try_new(existing.schema(), batch.columns().to_vec())
            .map_err(|e| HiveError::parquet_at(path, "align schema for", e))?;
        let merged = table::concat(&existing.schema(), &[existing, incoming])?;

        log::debug!(
            "Merged {} new rows into '{}' ({} rows total)",
            batch.num_rows(),
            path.display(),
            merged.num_rows()
        );
        table::write_batch(path, &merged, options)?;
        Ok(merged.num_rows())
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| HiveError::io(parent, "create partition directory", e))?;
        }

        log::debug!(
            "Created '{}' with {} rows",
            path.display(),
            batch.num_rows()
        );
        table::write_batch(path, batch, options)?;
        Ok(batch.num_rows())
    }
}
