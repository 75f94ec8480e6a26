//! Parquet write options for partition files.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_ROW_GROUP_SIZE;
use crate::error::{HiveError, Result};

/// Compression codec for partition files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    /// Snappy compression (fast, moderate ratio). Default.
    #[default]
    Snappy,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl FromStr for ParquetCompression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Ok(ParquetCompression::Snappy),
            "zstd" => Ok(ParquetCompression::Zstd),
            other => Err(format!(
                "unknown compression '{}' (expected 'snappy' or 'zstd')",
                other
            )),
        }
    }
}

impl fmt::Display for ParquetCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParquetCompression::Snappy => write!(f, "snappy"),
            ParquetCompression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Configuration options for writing partition files.
///
/// A merge rewrites the whole partition file, so these options apply to the
/// old rows as well as the new ones.
#[derive(Debug, Clone)]
pub struct ParquetWriteOptions {
    /// Maximum rows per row group. Default: 100,000.
    pub row_group_size: usize,

    /// Compression codec. Default: Snappy.
    pub compression: ParquetCompression,
}

impl Default for ParquetWriteOptions {
    fn default() -> Self {
        Self {
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            compression: ParquetCompression::Snappy,
        }
    }
}

impl ParquetWriteOptions {
    /// Validate options. Returns error if any values are out of bounds.
    pub fn validate(&self) -> Result<()> {
        if self.row_group_size == 0 {
            return Err(HiveError::config("row_group_size must be > 0"));
        }
        Ok(())
    }

    /// Convert options to parquet WriterProperties.
    pub fn to_writer_properties(&self) -> Result<parquet::file::properties::WriterProperties> {
        self.validate()?;
        use parquet::basic::{Compression, ZstdLevel};
        use parquet::file::properties::{WriterProperties, WriterVersion};

        let compression = match self.compression {
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
        };

        Ok(WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .set_compression(compression)
            .set_max_row_group_size(self.row_group_size)
            .build())
    }
}
