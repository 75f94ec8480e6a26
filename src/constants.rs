//! Constants shared by the hive pipeline: layout names, defaults, and
//! Parquet tuning.

// ============================================================================
// Hive Layout
// ============================================================================

/// Column holding the record identifier in every input file.
pub const ID_COLUMN: &str = "id";

/// Name of the partition key, used both as the auxiliary column and as the
/// `key=value` directory prefix.
pub const PARTITION_COLUMN: &str = "id_mod";

/// Extension of partition files.
pub const PARTITION_EXTENSION: &str = "parquet";

/// Manifest file at the hive root. The leading underscore keeps hive-aware
/// readers from treating it as data.
pub const MANIFEST_FILE: &str = "_hive.toml";

/// Magic string identifying a genohive manifest.
pub const MANIFEST_MAGIC: &str = "GENOHIVE_V1";

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

// ============================================================================
// Pipeline Defaults
// ============================================================================

/// Default number of buckets (`id % 256`).
pub const DEFAULT_BUCKET_COUNT: u64 = 256;

/// Default number of input files handed to one worker.
pub const DEFAULT_GROUP_SIZE: usize = 5;

/// Default worker pool size.
pub const DEFAULT_THREADS: usize = 1;

// ============================================================================
// Parquet
// ============================================================================

/// Default row group size for partition files.
pub(crate) const DEFAULT_ROW_GROUP_SIZE: usize = 100_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        assert!(DEFAULT_BUCKET_COUNT > 0);
        assert!(DEFAULT_GROUP_SIZE > 0);
        assert!(DEFAULT_THREADS > 0);
        assert!(DEFAULT_ROW_GROUP_SIZE > 0);
    }

    #[test]
    fn test_manifest_is_hidden_from_hive_readers() {
        assert!(MANIFEST_FILE.starts_with('_'));
        assert!(!MANIFEST_FILE.ends_with(PARTITION_EXTENSION));
    }
}
