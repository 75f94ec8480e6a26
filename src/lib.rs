//! genohive: hive partitioning of genotype Parquet files.
//!
//! Records from many independently produced files are regrouped so that all
//! rows for an identifier live under `{prefix}/id_mod={id % 256}/`. Readers
//! then touch one directory per lookup instead of every input file.
//!
//! ```ignore
//! use genohive::{run_hive, HiveOptions};
//!
//! let options = HiveOptions { threads: 4, ..Default::default() };
//! let report = run_hive(&inputs, Path::new("genotypes_hive"), &options)?;
//! println!("{} rows written", report.rows_written());
//! ```

pub mod bucket;
pub mod config;
pub mod constants;
pub mod error;
pub mod hive;
pub mod logging;
pub mod table;

pub use bucket::{assign, assign_signed, bucket_column, RecordId};
pub use error::{FirstErrorCapture, HiveError, Result};
pub use hive::manifest::HiveManifest;
pub use hive::worker::{run_worker, PartitionWrite, WorkerReport};
pub use hive::{
    list_buckets, partition_dir, partition_path, read_bucket, read_id, run_hive, write_or_merge,
    HiveOptions, HiveReport, WorkGroup,
};
pub use table::{ParquetCompression, ParquetWriteOptions};
