//! Command-line argument definitions for the genohive CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use genohive::constants::{DEFAULT_BUCKET_COUNT, DEFAULT_GROUP_SIZE, DEFAULT_THREADS};
use genohive::{ParquetCompression, RecordId};

#[derive(Parser)]
#[command(name = "genohive")]
#[command(about = "Hive-partition genotype Parquet files by id modulo a bucket count")]
#[command(
    long_about = "genohive: regroup genotype records from many Parquet files into a hive layout.

LAYOUT:
  {output}/id_mod={id % bucket_count}/{worker}.parquet

  Every file under id_mod=N holds only records whose id falls in bucket N.
  Each worker writes its own file per bucket; re-running appends to them.
  Re-running on files that were already ingested duplicates their rows."
)]
#[command(after_help = "EXAMPLES:
  # Partition three files with two workers
  genohive hive -i s1.parquet -i s2.parquet -i s3.parquet -o genotypes_hive -t 2

  # Same, driven by a TOML config
  genohive hive-config hive.toml

  # Read back every record for one id
  genohive lookup --hive genotypes_hive --id 4242")]
pub struct Cli {
    /// Enable verbose progress output with timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Partition input files into a hive
    Hive {
        /// Input Parquet files with an integer `id` column.
        /// Can specify multiple times: -i a.parquet -i b.parquet
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Hive root directory (created if missing)
        #[arg(short, long)]
        output: PathBuf,

        /// Number of input files handed to one worker at a time
        #[arg(short, long, default_value_t = DEFAULT_GROUP_SIZE, value_parser = parse_positive)]
        group_size: usize,

        /// Worker count (capped at the number of input files)
        #[arg(short, long, default_value_t = DEFAULT_THREADS, value_parser = parse_positive)]
        threads: usize,

        /// Number of buckets. Must match the count the hive was created with.
        #[arg(long, default_value_t = DEFAULT_BUCKET_COUNT)]
        bucket_count: u64,

        /// Partition file compression: snappy or zstd
        #[arg(long, default_value_t = ParquetCompression::Snappy)]
        compression: ParquetCompression,
    },

    /// Partition input files described by a TOML config file
    HiveConfig {
        /// Path to the TOML config
        config: PathBuf,
    },

    /// List the buckets present in a hive
    Buckets {
        /// Hive root directory
        #[arg(long)]
        hive: PathBuf,
    },

    /// Print every record stored for one id
    Lookup {
        /// Hive root directory
        #[arg(long)]
        hive: PathBuf,

        /// Identifier to look up (full u64 range, or negative for signed ids)
        #[arg(long, allow_negative_numbers = true)]
        id: RecordId,

        /// Bucket count, used only when the hive has no manifest
        #[arg(long, default_value_t = DEFAULT_BUCKET_COUNT)]
        bucket_count: u64,
    },
}

/// Parse a strictly positive integer argument.
pub fn parse_positive(s: &str) -> Result<usize, String> {
    let val: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid positive integer", s))?;
    if val == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(val)
}
