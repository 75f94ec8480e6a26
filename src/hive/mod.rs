//! Hive partitioning of genotype files by `id mod bucket_count`.
//!
//! Input files are split into fixed-size work groups, and a fixed-size pool
//! of workers merges each group into the hive:
//!
//! ```text
//! {output_prefix}/id_mod={bucket}/{worker_label}.parquet
//! ```
//!
//! The worker label is the worker's pool slot index. Slots are unique within
//! a pool, so two workers running at the same time never write the same
//! partition file and no locking is needed. Across runs, partition files
//! only grow: rows are appended, never deduplicated.

pub mod manifest;
pub mod partition;
pub mod planner;
pub mod reader;
pub mod worker;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::bucket::check_bucket_count;
use crate::constants::{DEFAULT_BUCKET_COUNT, DEFAULT_GROUP_SIZE, DEFAULT_THREADS};
use crate::error::{FirstErrorCapture, HiveError, Result};
use crate::table::ParquetWriteOptions;

use manifest::HiveManifest;
use planner::{effective_threads, plan};
use worker::{run_worker, WorkerReport};

pub use partition::{partition_dir, partition_path, write_or_merge};
pub use planner::{GroupEntry, WorkGroup};
pub use reader::{list_buckets, partition_files, read_bucket, read_id};

/// Options for [`run_hive`].
#[derive(Debug, Clone)]
pub struct HiveOptions {
    /// Input files per work group. Default: 5.
    pub group_size: usize,

    /// Requested worker count; capped at the number of input files. Default: 1.
    pub threads: usize,

    /// Number of buckets. Must match the count an existing hive was built with. Default: 256.
    pub bucket_count: u64,

    /// Options for writing partition files.
    pub write: ParquetWriteOptions,
}

impl Default for HiveOptions {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            threads: DEFAULT_THREADS,
            bucket_count: DEFAULT_BUCKET_COUNT,
            write: ParquetWriteOptions::default(),
        }
    }
}

impl HiveOptions {
    pub fn validate(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(HiveError::config("group_size must be > 0"));
        }
        if self.threads == 0 {
            return Err(HiveError::config("threads must be > 0"));
        }
        check_bucket_count(self.bucket_count)?;
        self.write.validate()
    }
}

/// Summary of a [`run_hive`] call.
#[derive(Debug, Clone, Default)]
pub struct HiveReport {
    /// Work groups in the plan.
    pub groups: usize,

    /// Pool size actually used.
    pub threads: usize,

    /// One report per group, ordered by group index.
    pub workers: Vec<WorkerReport>,
}

impl HiveReport {
    /// Rows written across all groups.
    pub fn rows_written(&self) -> usize {
        self.workers.iter().map(WorkerReport::rows_written).sum()
    }

    /// Distinct worker labels that wrote partition files.
    pub fn worker_labels(&self) -> BTreeSet<String> {
        self.workers.iter().map(|w| w.label.clone()).collect()
    }
}

/// Reorganize `paths` into a hive under `output_prefix`.
///
/// Every work group is processed exactly once, in any order. A failing group
/// does not stop the others: the first failure is returned once all groups
/// are done, and partitions already written stay on disk.
///
/// Empty `paths` is a no-op: nothing is created.
pub fn run_hive(paths: &[PathBuf], output_prefix: &Path, options: &HiveOptions) -> Result<HiveReport> {
    if paths.is_empty() {
        log::info!("No input files, nothing to partition");
        return Ok(HiveReport::default());
    }
    options.validate()?;

    let threads = effective_threads(options.threads, paths.len());
    let groups = plan(paths, options.group_size)?;
    HiveManifest::ensure(output_prefix, options.bucket_count)?;

    log::info!(
        "Partitioning {} files into '{}': {} groups of {}, {} workers, {} buckets",
        paths.len(),
        output_prefix.display(),
        groups.len(),
        options.group_size,
        threads,
        options.bucket_count
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|slot| format!("hive-worker-{}", slot))
        .build()
        .map_err(|e| HiveError::config(format!("failed to build worker pool: {}", e)))?;

    let next_group = AtomicUsize::new(0);
    let first_error = FirstErrorCapture::new();

    // Each pool slot claims groups until none are left, so a slot never runs
    // two groups at once and its label stays exclusive.
    let per_slot: Vec<Vec<WorkerReport>> = pool.broadcast(|ctx| {
        let label = ctx.index().to_string();
        let mut reports = Vec::new();

        loop {
            let claimed = next_group.fetch_add(1, Ordering::SeqCst);
            let Some(group) = groups.get(claimed) else {
                break;
            };

            match run_worker(group, output_prefix, &label, options) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    log::error!("Worker {} failed on group {}: {}", label, group.index, e);
                    first_error.store(HiveError::worker(label.as_str(), group.index, e));
                }
            }
        }

        reports
    });

    if let Some(err) = first_error.get() {
        return Err(err);
    }

    let mut workers: Vec<WorkerReport> = per_slot.into_iter().flatten().collect();
    workers.sort_by_key(|report| report.group);

    let report = HiveReport {
        groups: groups.len(),
        threads,
        workers,
    };
    log::info!(
        "Wrote {} rows from {} groups",
        report.rows_written(),
        report.groups
    );
    Ok(report)
}
