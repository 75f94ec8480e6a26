//! Handlers for the hive subcommands.

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use std::path::{Path, PathBuf};

use genohive::config::{parse_config, validate_config};
use genohive::{list_buckets, read_id, run_hive, HiveOptions, HiveReport, RecordId};

/// Partition `inputs` into the hive at `output`.
pub fn partition_files(inputs: &[PathBuf], output: &Path, options: &HiveOptions) -> Result<()> {
    for input in inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    let report = run_hive(inputs, output, options)
        .with_context(|| format!("Failed to build hive in {}", output.display()))?;
    print_report(&report, output);
    Ok(())
}

/// Partition the inputs listed in a TOML config.
pub fn partition_from_config(config_path: &Path) -> Result<()> {
    let config = parse_config(config_path)?;
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    validate_config(&config, &config_dir)?;

    log::info!("Loaded config from {}", config_path.display());

    let inputs = config.input_paths(&config_dir);
    let output = config.output_prefix(&config_dir);
    partition_files(&inputs, &output, &config.hive_options())
}

/// Print the buckets present in a hive, one per line.
pub fn print_buckets(hive: &Path) -> Result<()> {
    let buckets =
        list_buckets(hive).with_context(|| format!("Failed to list hive {}", hive.display()))?;
    for bucket in &buckets {
        println!("{}", bucket);
    }
    log::info!("{} buckets in {}", buckets.len(), hive.display());
    Ok(())
}

/// Print every record stored for `id`.
pub fn lookup(hive: &Path, id: RecordId, bucket_count: u64) -> Result<()> {
    let batches = read_id(hive, id, bucket_count)
        .with_context(|| format!("Failed to read id {} from {}", id, hive.display()))?;

    if batches.is_empty() {
        eprintln!("No records for id {}", id);
        return Ok(());
    }

    println!("{}", pretty_format_batches(&batches)?);
    Ok(())
}

fn print_report(report: &HiveReport, output: &Path) {
    eprintln!(
        "Wrote {} rows from {} groups into {} ({} workers)",
        report.rows_written(),
        report.groups,
        output.display(),
        report.threads
    );
}
