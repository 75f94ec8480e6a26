//! Hive manifest: pins the bucket count a hive was built with.
//!
//! Merging rows bucketed with a different count into an existing hive would
//! scatter records of the same identifier across unrelated directories, so
//! every run checks the manifest before writing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::partition::parse_partition_dir;
use crate::constants::{MANIFEST_FILE, MANIFEST_MAGIC, MANIFEST_VERSION, PARTITION_COLUMN};
use crate::error::{HiveError, Result};

/// Metadata stored at the hive root as TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveManifest {
    /// Magic string for format identification.
    pub magic: String,

    /// Format version for compatibility checking.
    pub format_version: u32,

    /// Name of the partition key in directory names.
    pub partition_column: String,

    /// Modulus used to assign buckets.
    pub bucket_count: u64,
}

impl HiveManifest {
    pub fn new(bucket_count: u64) -> Self {
        Self {
            magic: MANIFEST_MAGIC.to_string(),
            format_version: MANIFEST_VERSION,
            partition_column: PARTITION_COLUMN.to_string(),
            bucket_count,
        }
    }

    /// Save manifest to the hive root.
    pub fn save(&self, output_prefix: &Path) -> Result<()> {
        let path = output_prefix.join(MANIFEST_FILE);
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| HiveError::internal(format!("failed to serialize manifest: {}", e)))?;
        fs::write(&path, toml_str).map_err(|e| HiveError::io(&path, "write manifest", e))?;
        Ok(())
    }

    /// Load manifest from the hive root, validating magic and version.
    pub fn load(output_prefix: &Path) -> Result<Self> {
        let path = output_prefix.join(MANIFEST_FILE);
        let toml_str =
            fs::read_to_string(&path).map_err(|e| HiveError::io(&path, "read manifest", e))?;
        let manifest: Self = toml::from_str(&toml_str).map_err(|e| {
            HiveError::config(format!("failed to parse manifest '{}': {}", path.display(), e))
        })?;

        if manifest.magic != MANIFEST_MAGIC {
            return Err(HiveError::config(format!(
                "invalid manifest magic in '{}': expected '{}', got '{}'",
                path.display(),
                MANIFEST_MAGIC,
                manifest.magic
            )));
        }
        if manifest.format_version > MANIFEST_VERSION {
            return Err(HiveError::config(format!(
                "unsupported manifest version {} in '{}' (max supported: {})",
                manifest.format_version,
                path.display(),
                MANIFEST_VERSION
            )));
        }

        Ok(manifest)
    }

    /// Check the hive at `output_prefix` was built with `bucket_count`,
    /// creating the root and its manifest when missing.
    ///
    /// A hive without a manifest is adopted as-is, unless one of its
    /// `id_mod=` directories is out of range for `bucket_count`.
    pub fn ensure(output_prefix: &Path, bucket_count: u64) -> Result<Self> {
        if output_prefix.join(MANIFEST_FILE).exists() {
            let manifest = Self::load(output_prefix)?;
            if manifest.bucket_count != bucket_count {
                return Err(HiveError::config(format!(
                    "hive '{}' was built with bucket_count={}, refusing to merge rows bucketed with {}",
                    output_prefix.display(),
                    manifest.bucket_count,
                    bucket_count
                )));
            }
            return Ok(manifest);
        }

        if output_prefix.is_dir() {
            check_existing_buckets(output_prefix, bucket_count)?;
        } else {
            fs::create_dir_all(output_prefix)
                .map_err(|e| HiveError::io(output_prefix, "create hive directory", e))?;
        }

        let manifest = Self::new(bucket_count);
        manifest.save(output_prefix)?;
        log::info!(
            "Created hive manifest in '{}' (bucket_count={})",
            output_prefix.display(),
            bucket_count
        );
        Ok(manifest)
    }
}

fn check_existing_buckets(output_prefix: &Path, bucket_count: u64) -> Result<()> {
    let entries =
        fs::read_dir(output_prefix).map_err(|e| HiveError::io(output_prefix, "list hive", e))?;

    for entry in entries {
        let entry = entry.map_err(|e| HiveError::io(output_prefix, "list hive", e))?;
        let name = entry.file_name();
        if let Some(bucket) = name.to_str().and_then(parse_partition_dir) {
            if bucket >= bucket_count {
                return Err(HiveError::config(format!(
                    "hive '{}' contains bucket {} which is out of range for bucket_count={}",
                    output_prefix.display(),
                    bucket,
                    bucket_count
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_creates_then_accepts_same_count() {
        let dir = tempdir().unwrap();
        let hive = dir.path().join("hive");

        let created = HiveManifest::ensure(&hive, 256).unwrap();
        assert!(hive.join(MANIFEST_FILE).exists());
        assert_eq!(created.bucket_count, 256);

        let again = HiveManifest::ensure(&hive, 256).unwrap();
        assert_eq!(again, created);
    }

    #[test]
    fn test_ensure_rejects_different_count() {
        let dir = tempdir().unwrap();
        HiveManifest::ensure(dir.path(), 256).unwrap();

        let err = HiveManifest::ensure(dir.path(), 128).unwrap_err();
        assert!(matches!(err, HiveError::Config(_)));
        assert!(err.to_string().contains("bucket_count=256"));
    }

    #[test]
    fn test_ensure_adopts_legacy_hive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("id_mod=12")).unwrap();

        assert!(HiveManifest::ensure(dir.path(), 256).is_ok());
    }

    #[test]
    fn test_ensure_rejects_legacy_hive_with_out_of_range_bucket() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("id_mod=200")).unwrap();

        assert!(HiveManifest::ensure(dir.path(), 16).is_err());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let mut manifest = HiveManifest::new(256);
        manifest.magic = "SOMETHING_ELSE".to_string();
        manifest.save(dir.path()).unwrap();

        assert!(HiveManifest::load(dir.path()).is_err());
    }
}
