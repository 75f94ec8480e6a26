//! Consumer-side access to a hive: find and read the partition of an id.

use arrow::array::{BooleanArray, RecordBatch};
use arrow::compute::filter_record_batch;
use std::fs;
use std::path::{Path, PathBuf};

use super::manifest::HiveManifest;
use super::partition::{parse_partition_dir, partition_dir};
use crate::bucket::{self, RecordId};
use crate::constants::{ID_COLUMN, MANIFEST_FILE, PARTITION_EXTENSION};
use crate::error::{HiveError, Result};
use crate::table;

/// Buckets that have a partition directory, sorted.
pub fn list_buckets(output_prefix: &Path) -> Result<Vec<u64>> {
    let entries =
        fs::read_dir(output_prefix).map_err(|e| HiveError::io(output_prefix, "list hive", e))?;

    let mut buckets = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HiveError::io(output_prefix, "list hive", e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(bucket) = entry.file_name().to_str().and_then(parse_partition_dir) {
            buckets.push(bucket);
        }
    }
    buckets.sort_unstable();
    Ok(buckets)
}

/// Partition files of `bucket`, sorted by name. Empty if the bucket has no directory.
pub fn partition_files(output_prefix: &Path, bucket: u64) -> Result<Vec<PathBuf>> {
    let dir = partition_dir(output_prefix, bucket);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&dir).map_err(|e| HiveError::io(&dir, "list partition", e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| HiveError::io(&dir, "list partition", e))?
            .path();
        let is_partition = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(PARTITION_EXTENSION))
            .unwrap_or(false);
        if is_partition && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every partition file of `bucket`, one batch per file.
pub fn read_bucket(output_prefix: &Path, bucket: u64) -> Result<Vec<RecordBatch>> {
    partition_files(output_prefix, bucket)?
        .iter()
        .map(|path| table::read_batch(path))
        .collect()
}

/// Read all rows for identifier `id`.
///
/// The bucket count is taken from the hive manifest when present, else
/// `bucket_count` is used. Ids are matched by numeric value whatever the
/// integer type of the stored column.
pub fn read_id(output_prefix: &Path, id: RecordId, bucket_count: u64) -> Result<Vec<RecordBatch>> {
    let bucket_count = if output_prefix.join(MANIFEST_FILE).exists() {
        HiveManifest::load(output_prefix)?.bucket_count
    } else {
        bucket_count
    };
    let bucket = id.bucket(bucket_count)?;
    log::debug!(
        "id {} lives in bucket {} of '{}'",
        id,
        bucket,
        output_prefix.display()
    );

    let mut matches = Vec::new();
    for path in partition_files(output_prefix, bucket)? {
        let batch = table::read_batch(&path)?;
        let mask = id_mask(&batch, id, &path)?;
        let rows = filter_record_batch(&batch, &mask)?;
        if rows.num_rows() > 0 {
            matches.push(rows);
        }
    }
    Ok(matches)
}

fn id_mask(batch: &RecordBatch, id: RecordId, origin: &Path) -> Result<BooleanArray> {
    let ids = batch.column_by_name(ID_COLUMN).ok_or_else(|| {
        HiveError::input(origin, format!("missing required column '{}'", ID_COLUMN))
    })?;
    bucket::id_mask(ids.as_ref(), id, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hive::partition::{partition_path, write_or_merge};
    use crate::table::ParquetWriteOptions;
    use arrow::array::{Int64Array, StringArray, UInt64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn batch(ids: &[i64], tag: &str) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("tag", DataType::Utf8, false),
        ]));
        let tags: Vec<&str> = ids.iter().map(|_| tag).collect();
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids.to_vec())),
                Arc::new(StringArray::from(tags)),
            ],
        )
        .unwrap()
    }

    fn populated_hive() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let opts = ParquetWriteOptions::default();
        write_or_merge(&batch(&[5, 261, 5], "w0"), &partition_path(dir.path(), 5, "0"), &opts)
            .unwrap();
        write_or_merge(&batch(&[517, 5], "w1"), &partition_path(dir.path(), 5, "1"), &opts)
            .unwrap();
        write_or_merge(&batch(&[9], "w0"), &partition_path(dir.path(), 9, "0"), &opts).unwrap();
        HiveManifest::new(256).save(dir.path()).unwrap();
        dir
    }

    #[test]
    fn test_list_buckets_sorted_and_skips_files() {
        let hive = populated_hive();
        assert_eq!(list_buckets(hive.path()).unwrap(), vec![5, 9]);
    }

    #[test]
    fn test_partition_files_sorted_by_label() {
        let hive = populated_hive();
        let files = partition_files(hive.path(), 5).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0.parquet", "1.parquet"]);
        assert!(partition_files(hive.path(), 100).unwrap().is_empty());
    }

    #[test]
    fn test_read_bucket_reads_all_workers() {
        let hive = populated_hive();
        let batches = read_bucket(hive.path(), 5).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 5);
    }

    #[test]
    fn test_read_id_keeps_only_matching_rows() {
        let hive = populated_hive();

        let batches = read_id(hive.path(), RecordId::Signed(5), 256).unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 3);

        assert!(read_id(hive.path(), RecordId::Signed(6), 256).unwrap().is_empty());
    }

    #[test]
    fn test_read_id_prefers_manifest_bucket_count() {
        let hive = populated_hive();
        // Bucket count argument is ignored when the hive records its own.
        let batches = read_id(hive.path(), RecordId::Unsigned(9), 16).unwrap();
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 1);
    }

    #[test]
    fn test_read_id_unsigned_ids_above_i64_max() {
        let dir = tempdir().unwrap();
        let hashed = (1u64 << 63) | 5;
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::UInt64, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(UInt64Array::from(vec![hashed, 5, hashed]))],
        )
        .unwrap();
        write_or_merge(
            &batch,
            &partition_path(dir.path(), 5, "0"),
            &ParquetWriteOptions::default(),
        )
        .unwrap();
        HiveManifest::new(256).save(dir.path()).unwrap();

        let found = read_id(dir.path(), RecordId::Unsigned(hashed), 256).unwrap();
        assert_eq!(found.iter().map(|b| b.num_rows()).sum::<usize>(), 2);

        // The same bits read as a signed id are a different, negative id.
        let found = read_id(dir.path(), RecordId::Signed(hashed as i64), 256).unwrap();
        assert!(found.is_empty());

        let found = read_id(dir.path(), RecordId::Signed(5), 256).unwrap();
        assert_eq!(found.iter().map(|b| b.num_rows()).sum::<usize>(), 1);
    }
}
